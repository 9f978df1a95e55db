// src/exec/result.rs

//! Per-attempt and per-run result types.

use chrono::{DateTime, Utc};

use crate::types::{ExecutionStatus, NodeId};

/// Outcome of a single completed attempt, or the terminal view of a node.
#[derive(Debug, Clone)]
pub struct ExecutionResult<T, R> {
    pub id: T,
    pub result: Option<R>,
    pub status: ExecutionStatus,
    /// Error text for `Errored`, reason for `Cancelled`.
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl<T, R> ExecutionResult<T, R> {
    pub fn success(id: T, result: R, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            id,
            result: Some(result),
            status: ExecutionStatus::Success,
            message: None,
            started_at: Some(started_at),
            ended_at: Some(ended_at),
        }
    }

    pub fn errored(
        id: T,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            result: None,
            status: ExecutionStatus::Errored,
            message: Some(message.into()),
            started_at: Some(started_at),
            ended_at: Some(ended_at),
        }
    }

    pub fn cancelled(
        id: T,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            result: None,
            status: ExecutionStatus::Cancelled,
            message: Some(message.into()),
            started_at: Some(started_at),
            ended_at: Some(ended_at),
        }
    }

    pub fn skipped(id: T) -> Self {
        Self {
            id,
            result: None,
            status: ExecutionStatus::Skipped,
            message: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_errored(&self) -> bool {
        self.status.is_errored()
    }

    pub fn is_skipped(&self) -> bool {
        self.status.is_skipped()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }
}

/// An ordered collection of results.
///
/// Returned by `execute`/`recover_execution` (one entry per node that reached
/// a status) and handed to task gates (one entry per direct predecessor).
#[derive(Debug, Clone)]
pub struct ExecutionResults<T, R> {
    results: Vec<ExecutionResult<T, R>>,
}

impl<T, R> Default for ExecutionResults<T, R> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<T: NodeId, R> ExecutionResults<T, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ExecutionResult<T, R>) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionResult<T, R>> {
        self.results.iter()
    }

    pub fn get(&self, id: &T) -> Option<&ExecutionResult<T, R>> {
        self.results.iter().find(|r| &r.id == id)
    }

    pub fn status_of(&self, id: &T) -> Option<ExecutionStatus> {
        self.get(id).map(|r| r.status)
    }

    /// Ids with the given status, in result order.
    pub fn ids_with_status(&self, status: ExecutionStatus) -> Vec<T> {
        self.results
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn successful(&self) -> Vec<T> {
        self.ids_with_status(ExecutionStatus::Success)
    }

    pub fn errored(&self) -> Vec<T> {
        self.ids_with_status(ExecutionStatus::Errored)
    }

    pub fn skipped(&self) -> Vec<T> {
        self.ids_with_status(ExecutionStatus::Skipped)
    }

    pub fn cancelled(&self) -> Vec<T> {
        self.ids_with_status(ExecutionStatus::Cancelled)
    }

    pub fn has_any_error(&self) -> bool {
        self.results.iter().any(|r| r.is_errored())
    }

    pub fn all_skipped(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.is_skipped())
    }

    pub fn all_successful(&self) -> bool {
        self.results.iter().all(|r| r.is_success())
    }
}

impl<T, R> IntoIterator for ExecutionResults<T, R> {
    type Item = ExecutionResult<T, R>;
    type IntoIter = std::vec::IntoIter<ExecutionResult<T, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<T, R> FromIterator<ExecutionResult<T, R>> for ExecutionResults<T, R> {
    fn from_iter<I: IntoIterator<Item = ExecutionResult<T, R>>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
