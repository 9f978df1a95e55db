// tests/closure_provider.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use dagexec::{DagExecutor, ExecutionConfig, ExecutionStatus, FnTask, Phase, Task};
use dagexec_test_utils::{init_tracing, with_timeout};

fn provider(id: &&'static str) -> Arc<dyn Task<&'static str, usize>> {
    let id = *id;
    Arc::new(FnTask::new(move || async move {
        match id {
            "bad" => Err(anyhow!("bad input")),
            other => Ok(other.len()),
        }
    }))
}

#[tokio::test]
async fn closure_provider_and_fn_tasks() {
    init_tracing();

    let mut executor = DagExecutor::new(provider);
    executor.add_dependency("fetch", "parse").unwrap();
    executor.add_dependency("parse", "report").unwrap();
    executor.add_as_dependent_on_all_leaf_nodes("publish").unwrap();

    let results = with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    assert_eq!(results.successful(), vec!["fetch", "parse", "report", "publish"]);
    assert_eq!(results.get(&"report").and_then(|r| r.result), Some(6));
}

#[tokio::test]
async fn fn_task_errors_carry_the_message() {
    init_tracing();

    let mut executor = DagExecutor::new(provider);
    executor.add_dependency("bad", "never").unwrap();

    let results = with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    let bad = results.get(&"bad").unwrap();
    assert_eq!(bad.status, ExecutionStatus::Errored);
    assert_eq!(bad.message.as_deref(), Some("bad input"));
    assert_eq!(results.status_of(&"never"), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn state_is_observable_while_running() {
    init_tracing();

    let slow = |_: &u32| -> Arc<dyn Task<u32, ()>> {
        Arc::new(FnTask::new(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }))
    };
    let mut executor = DagExecutor::new(slow);
    executor.add_dependency(1, 2).unwrap();
    let state = executor.state();

    let observer = tokio::spawn({
        let state = Arc::clone(&state);
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            (state.phase(), state.unprocessed_count(), state.processed_count())
        }
    });

    with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    let (phase, unprocessed, processed) = observer.await.unwrap();
    assert_eq!(phase, Phase::Running);
    assert_eq!(unprocessed, 1);
    assert_eq!(processed, 0);
    assert_eq!(state.phase(), Phase::Terminated);
}
