// tests/traversal.rs

use dagexec::{DagExecutor, DotTraversar, LevelOrderTraversar};
use dagexec_test_utils::fake_task::FakeTaskProvider;

fn diamond_plus_island() -> DagExecutor<u32, String> {
    let mut executor = DagExecutor::new(FakeTaskProvider::new());
    executor.add_dependency(1, 2).unwrap();
    executor.add_dependency(1, 3).unwrap();
    executor.add_dependency(2, 4).unwrap();
    executor.add_dependency(3, 4).unwrap();
    executor.add_dependency(4, 5).unwrap();
    executor.add_independent(9).unwrap();
    executor
}

#[test]
fn level_order_prints_one_block_per_component() {
    let executor = diamond_plus_island();
    let mut out = String::new();
    executor.print(&LevelOrderTraversar, &mut out).unwrap();

    let expected = "\
Path #0
1[]
2[1] 3[1]
4[2, 3]
5[4]
Path #1
9[]
";
    assert_eq!(out, expected);
}

#[test]
fn dot_output_lists_every_edge() {
    let executor = diamond_plus_island();
    let mut out = String::new();
    executor.print(&DotTraversar, &mut out).unwrap();

    assert!(out.starts_with("digraph {"));
    assert_eq!(out.matches("->").count(), 5);
    assert!(out.contains("label = \"9\""));
    assert!(out.contains("0 -> 1"));
    assert!(!out.contains("\\\""), "labels are not Debug-quoted: {out}");
}
