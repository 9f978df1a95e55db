// src/dag/mod.rs

//! DAG representation.
//!
//! - [`node`] is the per-task record (edges, status, result, attempts).
//! - [`graph`] owns the nodes and computes initial/leaf/frontier views.
//! - [`validate`] is the one-shot cycle check run before execution.
//! - [`traversal`] renders the graph for humans (level order, DOT).

pub mod graph;
pub mod node;
pub mod traversal;
pub mod validate;

pub use graph::Graph;
pub use node::Node;
pub use traversal::{DotTraversar, LevelOrderTraversar, Traversar};
pub use validate::validate_acyclic;
