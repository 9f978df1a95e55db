// tests/property_random_dags.rs

use std::collections::BTreeSet;

use proptest::prelude::*;
use dagexec::dag::{validate_acyclic, Graph};
use dagexec::{DagExecutor, EngineOptions, ExecutionConfig, ExecutionStatus};
use dagexec_test_utils::fake_task::{FakeScript, FakeTaskProvider};

// Acyclic by construction: an edge only ever points from a lower to a
// higher index.
fn dag_strategy(max_nodes: u32) -> impl Strategy<Value = (u32, Vec<(u32, u32)>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        let edges = proptest::collection::vec((0..n, 0..n), 0..(n as usize * 2));
        edges.prop_map(move |raw| {
            let edges: BTreeSet<(u32, u32)> = raw
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.min(b), a.max(b)))
                .collect();
            (n, edges.into_iter().collect())
        })
    })
}

fn executor_for(
    n: u32,
    edges: &[(u32, u32)],
    provider: FakeTaskProvider<u32>,
) -> DagExecutor<u32, String> {
    let mut executor = DagExecutor::new(provider)
        .with_options(EngineOptions::default().with_workers(3));
    for id in 0..n {
        executor.add_independent(id).unwrap();
    }
    for (first, after) in edges {
        executor.add_dependency(*first, *after).unwrap();
    }
    executor
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn forward_only_graphs_are_acyclic((n, edges) in dag_strategy(12)) {
        let mut graph: Graph<u32, ()> = Graph::new();
        for id in 0..n {
            graph.add_independent(id);
        }
        for (first, after) in edges.iter() {
            graph.add_dependency(*first, *after);
        }
        prop_assert!(validate_acyclic(&graph).is_ok());
    }

    #[test]
    fn random_dag_terminates_with_every_node_processed((n, edges) in dag_strategy(10)) {
        let provider = FakeTaskProvider::new();
        let recorder = provider.recorder();
        let mut executor = executor_for(n, &edges, provider);

        let results = runtime()
            .block_on(executor.execute(ExecutionConfig::terminating()))
            .unwrap();

        prop_assert_eq!(results.len(), n as usize);
        prop_assert!(results.all_successful());
        prop_assert_eq!(executor.state().processed_count(), n as usize);
        for (first, after) in edges.iter() {
            prop_assert!(recorder.finished_before_started(first, after));
        }
        for id in 0..n {
            prop_assert_eq!(recorder.invocations(&id), 1);
        }
    }

    #[test]
    fn retry_budget_bounds_invocations(
        (n, edges) in dag_strategy(6),
        failures in proptest::collection::vec(0u32..4, 6),
        retries in 1u32..3,
    ) {
        let mut provider = FakeTaskProvider::new();
        for id in 0..n {
            provider = provider.with(id, FakeScript::failing(failures[id as usize]));
        }
        let recorder = provider.recorder();
        let mut executor = executor_for(n, &edges, provider);

        let results = runtime()
            .block_on(executor.execute(ExecutionConfig::immediate_retrying(retries)))
            .unwrap();

        for result in results.iter() {
            let id = result.id;
            let fails = failures[id as usize];
            let invoked = recorder.invocations(&id);
            prop_assert!(invoked <= retries + 1);
            if fails <= retries {
                prop_assert_eq!(result.status, ExecutionStatus::Success);
                prop_assert_eq!(invoked, fails + 1);
            } else {
                prop_assert_eq!(result.status, ExecutionStatus::Errored);
                prop_assert_eq!(invoked, retries + 1);
            }
        }
        prop_assert_eq!(executor.state().unprocessed_count(), 0);
    }
}
