// src/dag/traversal.rs

//! Human-readable renderings of a graph.
//!
//! - [`LevelOrderTraversar`] prints each connected component as a list of
//!   levels, where every node appears one level below its deepest
//!   predecessor.
//! - [`DotTraversar`] emits Graphviz DOT via `petgraph`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::{self, Write};

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::Graph;
use crate::types::NodeId;

/// Something that can render the current node/edge view of a graph.
pub trait Traversar {
    fn traverse<T: NodeId, R>(&self, graph: &Graph<T, R>, sink: &mut dyn Write) -> fmt::Result;
}

/// Level-by-level text rendering, one block per connected component.
///
/// ```text
/// Path #0
/// 1[]
/// 2[1] 3[1]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelOrderTraversar;

impl Traversar for LevelOrderTraversar {
    fn traverse<T: NodeId, R>(&self, graph: &Graph<T, R>, sink: &mut dyn Write) -> fmt::Result {
        for (index, component) in components(graph).into_iter().enumerate() {
            writeln!(sink, "Path #{index}")?;
            for level in levels(graph, &component) {
                let line = level
                    .iter()
                    .map(|id| {
                        let parents = graph
                            .incoming_of(id)
                            .iter()
                            .map(|p| p.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("{id}[{parents}]")
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(sink, "{line}")?;
            }
        }
        Ok(())
    }
}

/// Graphviz DOT rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotTraversar;

impl Traversar for DotTraversar {
    fn traverse<T: NodeId, R>(&self, graph: &Graph<T, R>, sink: &mut dyn Write) -> fmt::Result {
        let mut dot: DiGraph<String, &'static str> = DiGraph::new();
        let mut index: HashMap<&T, NodeIndex> = HashMap::new();

        for id in graph.ids() {
            index.insert(id, dot.add_node(id.to_string()));
        }
        for id in graph.ids() {
            for child in graph.outgoing_of(id) {
                if let (Some(&a), Some(&b)) = (index.get(id), index.get(child)) {
                    dot.add_edge(a, b, "");
                }
            }
        }

        write!(sink, "{}", Dot::with_config(&dot, &[Config::EdgeNoLabel]))
    }
}

/// Weakly connected components, each listed in first-mention order.
fn components<T: NodeId, R>(graph: &Graph<T, R>) -> Vec<Vec<T>> {
    let mut seen: HashSet<&T> = HashSet::new();
    let mut out = Vec::new();

    for start in graph.ids() {
        if seen.contains(start) {
            continue;
        }
        let mut members: HashSet<&T> = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            members.insert(id);
            queue.extend(graph.incoming_of(id).iter());
            queue.extend(graph.outgoing_of(id).iter());
        }
        out.push(
            graph
                .ids()
                .filter(|id| members.contains(id))
                .cloned()
                .collect(),
        );
    }

    out
}

/// Group a component into levels: a node sits one level below its deepest
/// predecessor. Assumes the graph is acyclic; nodes on a cycle are dropped.
fn levels<T: NodeId, R>(graph: &Graph<T, R>, component: &[T]) -> Vec<Vec<T>> {
    let mut remaining: HashMap<&T, usize> = component
        .iter()
        .map(|id| (id, graph.incoming_of(id).len()))
        .collect();
    let mut current: Vec<&T> = component
        .iter()
        .filter(|id| graph.incoming_of(id).is_empty())
        .collect();
    let mut out = Vec::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        for id in &current {
            for child in graph.outgoing_of(id) {
                if let Some(count) = remaining.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(child);
                    }
                }
            }
        }
        out.push(current.into_iter().cloned().collect());
        current = next;
    }

    out
}
