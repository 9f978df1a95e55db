// src/engine/state.rs

//! Run bookkeeping shared between the scheduler and outside observers.
//!
//! The scheduler is the only writer. Readers (tests, a Ctrl+C handler, a
//! progress printer) hold an `Arc<SchedulerState>` and may inspect it from any
//! thread while a run is in progress.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::exec::engine::ErrorIndex;
use crate::exec::result::ExecutionResult;
use crate::types::{NodeId, Phase, TaskOutput};

#[derive(Debug)]
pub struct SchedulerState<T: NodeId, R: TaskOutput> {
    phase: AtomicU8,
    /// Nodes with a terminal outcome. Append-only for the life of the run.
    processed: DashSet<T>,
    /// Successors held back while some task was in error.
    discontinued: DashSet<T>,
    /// Submitted attempts whose result has not been consumed yet.
    unprocessed: AtomicUsize,
    errored: ErrorIndex<T, R>,
}

impl<T: NodeId, R: TaskOutput> Default for SchedulerState<T, R> {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Building.as_u8()),
            processed: DashSet::new(),
            discontinued: DashSet::new(),
            unprocessed: AtomicUsize::new(0),
            errored: Arc::new(DashMap::new()),
        }
    }
}

impl<T: NodeId, R: TaskOutput> SchedulerState<T, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    pub fn is_processed(&self, id: &T) -> bool {
        self.processed.contains(id)
    }

    /// Processed ids, sorted.
    pub fn processed_nodes(&self) -> Vec<T> {
        sorted(self.processed.iter().map(|id| id.clone()))
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub(crate) fn mark_processed(&self, id: T) {
        self.processed.insert(id);
    }

    pub fn is_discontinued(&self, id: &T) -> bool {
        self.discontinued.contains(id)
    }

    /// Deferred successors, sorted.
    pub fn discontinued_nodes(&self) -> Vec<T> {
        sorted(self.discontinued.iter().map(|id| id.clone()))
    }

    pub fn has_discontinued(&self) -> bool {
        !self.discontinued.is_empty()
    }

    pub(crate) fn add_discontinued<I: IntoIterator<Item = T>>(&self, ids: I) {
        for id in ids {
            self.discontinued.insert(id);
        }
    }

    /// Remove and return every deferred successor, sorted.
    pub(crate) fn take_discontinued(&self) -> Vec<T> {
        let taken = self.discontinued_nodes();
        for id in taken.iter() {
            self.discontinued.remove(id);
        }
        taken
    }

    pub fn unprocessed_count(&self) -> usize {
        self.unprocessed.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_unprocessed(&self) {
        self.unprocessed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn decrement_unprocessed(&self) {
        // Never wraps: the counter only drops after a consumed result.
        let _ = self
            .unprocessed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub(crate) fn reset_unprocessed(&self) {
        self.unprocessed.store(0, Ordering::SeqCst);
    }

    /// Whether any task is currently in error.
    pub fn has_errors(&self) -> bool {
        !self.errored.is_empty()
    }

    /// Ids currently in error, sorted.
    pub fn errored_nodes(&self) -> Vec<T> {
        sorted(self.errored.iter().map(|entry| entry.key().clone()))
    }

    /// Failing attempt recorded for `id`, if it is in error.
    pub fn error_of(&self, id: &T) -> Option<ExecutionResult<T, R>> {
        self.errored.get(id).map(|entry| entry.value().clone())
    }

    pub(crate) fn error_index(&self) -> ErrorIndex<T, R> {
        Arc::clone(&self.errored)
    }
}

fn sorted<T: Ord>(ids: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = ids.collect();
    out.sort();
    out
}
