// src/engine/policy.rs

//! What the scheduler does with one completed attempt.
//!
//! This is the synchronous, deterministic half of the wait loop: given the
//! attempt's status, the node's attempt count and a snapshot of the run, it
//! returns the actions the async shell in `scheduler` must carry out. No
//! Tokio, no graph, no tasks; it is tested on its own.

use std::time::Duration;

use crate::config::ExecutionConfig;
use crate::types::ExecutionStatus;

/// Snapshot the decision is made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub status: ExecutionStatus,
    /// Completed attempts for the node, including this one.
    pub attempts: u32,
    /// `ExecutionEngine::is_any_task_in_error` after this result was recorded.
    pub any_in_error: bool,
    /// Whether deferred successors are waiting.
    pub has_discontinued: bool,
}

/// What happens to the node's direct successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Offer them to the readiness check now.
    Expand,
    /// Park them in the discontinued set until the error clears.
    Defer,
    /// Leave them alone.
    Stop,
}

/// How a failed node is submitted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    Immediate,
    Scheduled(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub kind: RetryKind,
    /// The coming attempt is the last one the budget allows.
    pub final_attempt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Add the node to the processed set.
    pub mark_processed: bool,
    /// Move every discontinued node back onto the frontier.
    pub resume_discontinued: bool,
    pub expansion: Expansion,
    pub retry: Option<Retry>,
}

/// Decide the follow-up for one completed attempt.
///
/// Checked in order:
/// - a success with no error left in the run resumes deferred successors;
/// - non-terminating runs, and runs with no error present, expand;
/// - a success while an error is present defers its successors;
/// - a failure with retry budget left is resubmitted;
/// - anything else stops.
///
/// A failure with budget left is retried even if the error index raced to
/// empty, so a node never ends up neither processed nor in flight.
pub fn decide(completion: &Completion, config: &ExecutionConfig) -> Decision {
    let status = completion.status;
    let retry_allowed =
        status.is_errored() && config.is_retrying() && completion.attempts <= config.retry_count;

    if retry_allowed {
        let kind = if config.is_scheduled_retrying() {
            RetryKind::Scheduled(config.retry_delay)
        } else {
            RetryKind::Immediate
        };
        return Decision {
            mark_processed: false,
            resume_discontinued: false,
            expansion: Expansion::Stop,
            retry: Some(Retry {
                kind,
                final_attempt: completion.attempts == config.retry_count,
            }),
        };
    }

    let resume_discontinued =
        status.is_success() && !completion.any_in_error && completion.has_discontinued;

    let expansion = if config.is_non_terminating() || !completion.any_in_error {
        Expansion::Expand
    } else if status.is_success() {
        Expansion::Defer
    } else {
        Expansion::Stop
    };

    Decision {
        mark_processed: true,
        resume_discontinued,
        expansion,
        retry: None,
    }
}
