// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};

use crate::dag::node::Node;
use crate::types::NodeId;

/// Mutable dependency graph keyed by node id.
///
/// Nodes are created lazily the first time an id is mentioned and are never
/// removed. Acyclicity is not enforced here; it is checked once by
/// [`crate::dag::validate::validate_acyclic`] before a run starts.
#[derive(Debug, Clone)]
pub struct Graph<T, R> {
    nodes: HashMap<T, Node<T, R>>,
    /// Ids in first-mention order.
    order: Vec<T>,
}

impl<T: NodeId, R> Default for Graph<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeId, R> Graph<T, R> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Ensure a node exists for `id`, without adding edges.
    pub fn add_independent(&mut self, id: T) {
        self.ensure_node(id);
    }

    /// Record that `first` must run before `after`.
    ///
    /// A self-dependency (`first == after`) creates the node but records no
    /// edge. Adding the same edge twice keeps a single edge.
    pub fn add_dependency(&mut self, first: T, after: T) {
        self.ensure_node(first.clone());
        self.ensure_node(after.clone());

        if first == after {
            return;
        }

        if let Some(node) = self.nodes.get_mut(&first) {
            node.add_outgoing(after.clone());
        }
        if let Some(node) = self.nodes.get_mut(&after) {
            node.add_incoming(first);
        }
    }

    /// Make `id` depend on every node that is currently a leaf.
    ///
    /// The leaf set is captured at call time. On an empty graph this is
    /// `add_independent`.
    pub fn add_as_dependent_on_all_leaf_nodes(&mut self, id: T) {
        if self.is_empty() {
            self.add_independent(id);
            return;
        }

        for leaf in self.leaf_nodes() {
            self.add_dependency(leaf, id.clone());
        }
    }

    /// Make every node that is currently initial depend on `id`.
    ///
    /// The initial set is captured at call time. On an empty graph this is
    /// `add_independent`.
    pub fn add_as_dependency_to_all_initial_nodes(&mut self, id: T) {
        if self.is_empty() {
            self.add_independent(id);
            return;
        }

        for initial in self.initial_nodes() {
            self.add_dependency(id.clone(), initial);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &T) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &T) -> Option<&Node<T, R>> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &T) -> Option<&mut Node<T, R>> {
        self.nodes.get_mut(id)
    }

    /// All node ids in first-mention order.
    pub fn ids(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    /// All nodes in first-mention order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<T, R>> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Nodes without predecessors.
    pub fn initial_nodes(&self) -> Vec<T> {
        self.nodes()
            .filter(|n| n.is_initial())
            .map(|n| n.id().clone())
            .collect()
    }

    /// Nodes without successors.
    pub fn leaf_nodes(&self) -> Vec<T> {
        self.nodes()
            .filter(|n| n.is_leaf())
            .map(|n| n.id().clone())
            .collect()
    }

    /// Direct predecessors of `id` (empty for unknown ids).
    pub fn incoming_of(&self, id: &T) -> &[T] {
        self.nodes.get(id).map(|n| n.incoming()).unwrap_or(&[])
    }

    /// Direct successors of `id` (empty for unknown ids).
    pub fn outgoing_of(&self, id: &T) -> &[T] {
        self.nodes.get(id).map(|n| n.outgoing()).unwrap_or(&[])
    }

    /// Frontier for resuming a partially processed graph.
    ///
    /// Walks down from the initial nodes through processed nodes and
    /// collects the first unprocessed nodes whose predecessors are all
    /// processed. `descend` decides whether the walk may continue below a
    /// processed node.
    pub fn non_processed_root_nodes<P, D>(&self, is_processed: P, descend: D) -> Vec<T>
    where
        P: Fn(&T) -> bool,
        D: Fn(&Node<T, R>) -> bool,
    {
        let mut frontier = Vec::new();
        let mut seen: HashSet<&T> = HashSet::new();
        let mut queue: VecDeque<&T> = self
            .order
            .iter()
            .filter(|id| self.incoming_of(id).is_empty())
            .collect();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };

            if is_processed(id) {
                if descend(node) {
                    queue.extend(node.outgoing().iter());
                }
            } else if node.incoming().iter().all(|p| is_processed(p)) {
                frontier.push(id.clone());
            }
        }

        frontier
    }

    fn ensure_node(&mut self, id: T) {
        if !self.nodes.contains_key(&id) {
            self.order.push(id.clone());
            self.nodes.insert(id.clone(), Node::new(id));
        }
    }
}
