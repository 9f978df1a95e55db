// tests/skip_cascade.rs

use dagexec::{DagExecutor, ExecutionConfig, ExecutionStatus};
use dagexec_test_utils::fake_task::{FakeScript, FakeTaskProvider};
use dagexec_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn skip_propagates_to_nodes_reachable_only_through_skipped_nodes() {
    init_tracing();

    // 1 -> 2 -> 3 -> 6, 1 -> 4, 2 skipped by its gate.
    let provider = FakeTaskProvider::new().with(2u32, FakeScript::skipped());
    let recorder = provider.recorder();
    let mut executor = DagExecutor::new(provider);
    executor.add_dependency(1, 2).unwrap();
    executor.add_dependency(2, 3).unwrap();
    executor.add_dependency(3, 6).unwrap();
    executor.add_dependency(1, 4).unwrap();

    let results = with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    assert_eq!(results.skipped(), vec![2, 3, 6]);
    assert_eq!(results.successful(), vec![1, 4]);
    for id in [2u32, 3, 6] {
        assert_eq!(recorder.invocations(&id), 0);
        assert_eq!(executor.graph().node(&id).unwrap().attempts(), 0);
        assert!(executor.state().is_processed(&id));
    }
}

#[tokio::test]
async fn node_with_one_healthy_parent_still_runs() {
    init_tracing();

    // 2 skipped; 5 depends on 2 and 4.
    let provider = FakeTaskProvider::new().with(2u32, FakeScript::skipped());
    let recorder = provider.recorder();
    let mut executor = DagExecutor::new(provider);
    executor.add_dependency(1, 2).unwrap();
    executor.add_dependency(1, 4).unwrap();
    executor.add_dependency(2, 5).unwrap();
    executor.add_dependency(4, 5).unwrap();

    let results = with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    assert_eq!(results.status_of(&2), Some(ExecutionStatus::Skipped));
    assert_eq!(results.status_of(&5), Some(ExecutionStatus::Success));
    assert_eq!(recorder.invocations(&5), 1);
}

#[tokio::test]
async fn skipped_initial_node_skips_its_subtree() {
    init_tracing();

    let provider = FakeTaskProvider::new().with(1u32, FakeScript::skipped());
    let recorder = provider.recorder();
    let mut executor = DagExecutor::new(provider);
    executor.add_dependency(1, 2).unwrap();
    executor.add_dependency(2, 3).unwrap();
    executor.add_independent(7).unwrap();

    let results = with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    assert_eq!(results.skipped(), vec![1, 2, 3]);
    assert_eq!(results.successful(), vec![7]);
    assert_eq!(recorder.started(), vec![7]);
}

#[tokio::test]
async fn fully_skipped_graph_terminates_without_engine_work() {
    init_tracing();

    let provider = FakeTaskProvider::new().with_default(FakeScript::skipped());
    let recorder = provider.recorder();
    let mut executor = DagExecutor::new(provider);
    executor.add_dependency(1u32, 2).unwrap();
    executor.add_dependency(1, 3).unwrap();

    let results = with_timeout(executor.execute(ExecutionConfig::terminating()))
        .await
        .unwrap();

    assert_eq!(results.skipped().len(), 3);
    assert!(recorder.started().is_empty());
    assert_eq!(executor.state().processed_count(), 3);
}
