// tests/policy_table.rs

use std::time::Duration;

use dagexec::engine::{decide, Completion, Expansion, RetryKind};
use dagexec::{ExecutionConfig, ExecutionStatus};

fn completion(status: ExecutionStatus, attempts: u32, any_in_error: bool) -> Completion {
    Completion {
        status,
        attempts,
        any_in_error,
        has_discontinued: false,
    }
}

#[test]
fn success_without_errors_expands() {
    let d = decide(
        &completion(ExecutionStatus::Success, 1, false),
        &ExecutionConfig::terminating(),
    );
    assert!(d.mark_processed);
    assert_eq!(d.expansion, Expansion::Expand);
    assert!(!d.resume_discontinued);
    assert!(d.retry.is_none());
}

#[test]
fn success_without_errors_resumes_discontinued() {
    let mut c = completion(ExecutionStatus::Success, 1, false);
    c.has_discontinued = true;

    let d = decide(&c, &ExecutionConfig::immediate_retrying(1));
    assert!(d.resume_discontinued);
    assert_eq!(d.expansion, Expansion::Expand);
}

#[test]
fn success_while_another_task_is_in_error_defers() {
    let mut c = completion(ExecutionStatus::Success, 1, true);
    c.has_discontinued = true;

    let d = decide(&c, &ExecutionConfig::terminating());
    assert!(d.mark_processed);
    assert!(!d.resume_discontinued);
    assert_eq!(d.expansion, Expansion::Defer);
}

#[test]
fn non_terminating_expands_even_after_error() {
    let config = ExecutionConfig::non_terminating();

    let d = decide(&completion(ExecutionStatus::Errored, 1, true), &config);
    assert!(d.mark_processed);
    assert_eq!(d.expansion, Expansion::Expand);
    assert!(d.retry.is_none());

    let d = decide(&completion(ExecutionStatus::Success, 1, true), &config);
    assert_eq!(d.expansion, Expansion::Expand);
}

#[test]
fn terminal_error_stops() {
    let d = decide(
        &completion(ExecutionStatus::Errored, 1, true),
        &ExecutionConfig::terminating(),
    );
    assert!(d.mark_processed);
    assert_eq!(d.expansion, Expansion::Stop);
    assert!(d.retry.is_none());
}

#[test]
fn error_with_budget_is_retried_immediately() {
    let config = ExecutionConfig::immediate_retrying(2);

    let d = decide(&completion(ExecutionStatus::Errored, 1, true), &config);
    assert!(!d.mark_processed);
    assert_eq!(d.expansion, Expansion::Stop);
    let retry = d.retry.unwrap();
    assert_eq!(retry.kind, RetryKind::Immediate);
    assert!(!retry.final_attempt);

    let d = decide(&completion(ExecutionStatus::Errored, 2, true), &config);
    assert!(d.retry.unwrap().final_attempt);

    let d = decide(&completion(ExecutionStatus::Errored, 3, true), &config);
    assert!(d.mark_processed);
    assert!(d.retry.is_none());
    assert_eq!(d.expansion, Expansion::Stop);
}

#[test]
fn scheduled_retry_carries_the_delay() {
    let delay = Duration::from_millis(750);
    let d = decide(
        &completion(ExecutionStatus::Errored, 1, true),
        &ExecutionConfig::scheduled_retrying(1, delay),
    );
    let retry = d.retry.unwrap();
    assert_eq!(retry.kind, RetryKind::Scheduled(delay));
    assert!(retry.final_attempt);
}

#[test]
fn cancelled_is_never_retried() {
    let d = decide(
        &completion(ExecutionStatus::Cancelled, 1, false),
        &ExecutionConfig::immediate_retrying(3),
    );
    assert!(d.mark_processed);
    assert!(d.retry.is_none());
    assert_eq!(d.expansion, Expansion::Expand);

    let d = decide(
        &completion(ExecutionStatus::Cancelled, 1, true),
        &ExecutionConfig::terminating(),
    );
    assert_eq!(d.expansion, Expansion::Stop);
}
