// src/dag/validate.rs

//! One-shot cycle detection run before any node is submitted.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::Graph;
use crate::errors::{DagexecError, Result};
use crate::types::NodeId;

/// Fail with [`DagexecError::DagCycle`] if the graph contains a cycle.
///
/// Every node is used as a DFS start point, so cycles in components that
/// have no initial node are caught too. Reaching a node that is already
/// fully processed is a normal merge point; reaching a node that is still on
/// the current DFS path is a cycle, reported as the edge that closed it.
pub fn validate_acyclic<T: NodeId, R>(graph: &Graph<T, R>) -> Result<()> {
    let mut done: HashSet<&T> = HashSet::new();
    let mut on_stack: HashSet<&T> = HashSet::new();

    for start in graph.ids() {
        if done.contains(start) {
            continue;
        }

        // Explicit DFS stack of (node, index of next outgoing edge to visit).
        let mut stack: Vec<(&T, usize)> = vec![(start, 0)];
        on_stack.insert(start);

        while let Some(top) = stack.last_mut() {
            let id = top.0;
            let next = top.1;
            let outgoing = graph.outgoing_of(id);

            if next < outgoing.len() {
                top.1 += 1;
                let child = &outgoing[next];

                if on_stack.contains(child) {
                    return Err(DagexecError::cycle(id, child));
                }
                if !done.contains(child) {
                    on_stack.insert(child);
                    stack.push((child, 0));
                }
            } else {
                on_stack.remove(id);
                done.insert(id);
                stack.pop();
            }
        }
    }

    debug!(nodes = graph.len(), "graph validated: no cycles");
    Ok(())
}
