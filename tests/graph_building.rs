// tests/graph_building.rs

use dagexec::dag::Graph;
use dagexec_test_utils::builders::{CANONICAL_EDGES, CANONICAL_INDEPENDENT};

fn canonical() -> Graph<u32, ()> {
    let mut graph = Graph::new();
    for (first, after) in CANONICAL_EDGES {
        graph.add_dependency(first, after);
    }
    graph.add_independent(CANONICAL_INDEPENDENT);
    graph
}

#[test]
fn repeated_edge_is_recorded_once() {
    let mut graph: Graph<u32, ()> = Graph::new();
    graph.add_dependency(1, 2);
    graph.add_dependency(1, 2);

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.outgoing_of(&1), &[2]);
    assert_eq!(graph.incoming_of(&2), &[1]);
}

#[test]
fn self_dependency_creates_node_without_edge() {
    let mut graph: Graph<&str, ()> = Graph::new();
    graph.add_dependency("a", "a");

    assert!(graph.contains(&"a"));
    assert_eq!(graph.len(), 1);
    assert!(graph.outgoing_of(&"a").is_empty());
    assert!(graph.incoming_of(&"a").is_empty());
    assert_eq!(graph.initial_nodes(), vec!["a"]);
    assert_eq!(graph.leaf_nodes(), vec!["a"]);
}

#[test]
fn add_independent_is_idempotent() {
    let mut graph: Graph<u32, ()> = Graph::new();
    graph.add_independent(7);
    graph.add_dependency(7, 8);
    graph.add_independent(7);

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.outgoing_of(&7), &[8]);
}

#[test]
fn canonical_initial_and_leaf_nodes_in_mention_order() {
    let graph = canonical();

    assert_eq!(graph.len(), 14);
    assert_eq!(graph.initial_nodes(), vec![1, 12, 11]);
    assert_eq!(graph.leaf_nodes(), vec![4, 5, 6, 7, 8, 10, 14, 11]);
    assert_eq!(graph.incoming_of(&4), &[3, 13]);
}

#[test]
fn dependent_on_all_leaves_uses_leaves_at_call_time() {
    let mut graph: Graph<u32, ()> = Graph::new();
    graph.add_dependency(1, 2);
    graph.add_dependency(1, 3);

    graph.add_as_dependent_on_all_leaf_nodes(4);
    assert_eq!(graph.incoming_of(&4), &[2, 3]);

    graph.add_as_dependent_on_all_leaf_nodes(5);
    assert_eq!(graph.incoming_of(&5), &[4]);
    assert_eq!(graph.leaf_nodes(), vec![5]);
}

#[test]
fn dependency_to_all_initial_uses_initial_nodes_at_call_time() {
    let mut graph: Graph<u32, ()> = Graph::new();
    graph.add_dependency(1, 2);
    graph.add_independent(3);

    graph.add_as_dependency_to_all_initial_nodes(0);
    assert_eq!(graph.outgoing_of(&0), &[1, 3]);
    assert_eq!(graph.initial_nodes(), vec![0]);
}

#[test]
fn convenience_builders_on_empty_graph_add_independent_node() {
    let mut graph: Graph<u32, ()> = Graph::new();
    graph.add_as_dependent_on_all_leaf_nodes(1);
    assert_eq!(graph.initial_nodes(), vec![1]);

    let mut graph: Graph<u32, ()> = Graph::new();
    graph.add_as_dependency_to_all_initial_nodes(1);
    assert_eq!(graph.leaf_nodes(), vec![1]);
}

#[test]
fn non_processed_root_nodes_stops_at_first_unprocessed_layer() {
    let graph = canonical();
    let processed = [1u32, 2, 3, 12];

    let frontier = graph.non_processed_root_nodes(|id| processed.contains(id), |_| true);

    // 4 waits on 13, which is itself on the frontier.
    assert_eq!(frontier, vec![11, 13, 7, 9, 8, 5, 6]);
}

#[test]
fn non_processed_root_nodes_respects_descend() {
    let graph = canonical();
    let processed = [1u32, 2, 3];

    let frontier = graph.non_processed_root_nodes(
        |id| processed.contains(id),
        |node| *node.id() != 2,
    );

    assert!(!frontier.contains(&7));
    assert!(frontier.contains(&5));
    assert!(frontier.contains(&12));
}
