// src/dag/node.rs

//! Per-task node record: edges plus the mutable outcome of the run.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::exec::result::ExecutionResult;
use crate::types::{ExecutionStatus, NodeId};

/// One schedulable unit in the graph.
///
/// Edges are stored as insertion-ordered id lists without duplicates, so
/// iteration over predecessors/successors is stable across runs.
#[derive(Debug, Clone)]
pub struct Node<T, R> {
    id: T,
    result: Option<R>,
    status: Option<ExecutionStatus>,
    /// Last error or cancellation reason reported for this node.
    message: Option<String>,
    incoming: Vec<T>,
    outgoing: Vec<T>,
    /// Number of completed attempts (initial run plus retries).
    attempts: u32,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl<T: NodeId, R> Node<T, R> {
    pub(crate) fn new(id: T) -> Self {
        Self {
            id,
            result: None,
            status: None,
            message: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            attempts: 0,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn id(&self) -> &T {
        &self.id
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    /// `None` until the node reaches a status during a run.
    pub fn status(&self) -> Option<ExecutionStatus> {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn incoming(&self) -> &[T] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[T] {
        &self.outgoing
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start of the last attempt.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// End of the last attempt.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_initial(&self) -> bool {
        self.incoming.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.outgoing.is_empty()
    }

    pub(crate) fn add_incoming(&mut self, id: T) {
        if !self.incoming.contains(&id) {
            self.incoming.push(id);
        }
    }

    pub(crate) fn add_outgoing(&mut self, id: T) {
        if !self.outgoing.contains(&id) {
            self.outgoing.push(id);
        }
    }

    /// Record the outcome of one completed engine attempt.
    pub(crate) fn record_attempt(&mut self, attempt: ExecutionResult<T, R>) {
        self.status = Some(attempt.status);
        self.result = attempt.result;
        self.message = attempt.message;
        self.started_at = attempt.started_at;
        self.ended_at = attempt.ended_at;
        self.attempts += 1;
    }

    /// Mark the node skipped by its execution gate. Skips never count as attempts.
    pub(crate) fn mark_skipped(&mut self) {
        self.status = Some(ExecutionStatus::Skipped);
        self.result = None;
        self.message = None;
    }

    /// Terminal view of this node, `None` if it never reached a status.
    pub fn to_result(&self) -> Option<ExecutionResult<T, R>>
    where
        R: Clone,
    {
        let status = self.status?;
        Some(ExecutionResult {
            id: self.id.clone(),
            result: self.result.clone(),
            status,
            message: self.message.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        })
    }
}

impl<T: PartialEq, R> PartialEq for Node<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: Eq, R> Eq for Node<T, R> {}

impl<T: Hash, R> Hash for Node<T, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
