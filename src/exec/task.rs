// src/exec/task.rs

//! The unit-of-work contract the scheduler runs.
//!
//! Callers hand the scheduler a [`TaskProvider`] that maps each node id to a
//! [`Task`]. The scheduler asks the task whether it wants to run at all
//! (given its predecessors' results), submits it to the engine, and between
//! retries tells it whether the coming attempt is the last one.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::exec::result::ExecutionResults;
use crate::types::{NodeId, TaskOutput};

/// Boxed future returned by [`Task::execute`].
pub type TaskFuture<'a, R> = Pin<Box<dyn Future<Output = anyhow::Result<R>> + Send + 'a>>;

/// A unit of work bound to one node.
///
/// Under retry policies a task may be executed more than once, so
/// implementations must be idempotent or guard themselves.
pub trait Task<T: NodeId, R: TaskOutput>: Send + Sync {
    /// Run one attempt.
    fn execute(&self) -> TaskFuture<'_, R>;

    /// Execution gate, consulted once the node's predecessors are all done.
    ///
    /// Returning `false` marks the node skipped without running it.
    ///
    /// The default is not an unconditional `true`: it refuses when the node
    /// has predecessors and all of them were skipped, so a skip propagates to
    /// everything reachable only through skipped nodes. Root nodes and nodes
    /// with at least one parent that ran (succeeded, errored or was
    /// cancelled) always pass. Override it to return `true` to run
    /// regardless of upstream skips.
    fn should_execute(&self, parent_results: &ExecutionResults<T, R>) -> bool {
        !parent_results.all_skipped()
    }

    /// Per-attempt timeout. `None` disables the timeout watcher.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Whether an attempt that has been running for `elapsed` is over time.
    fn is_timed_out(&self, elapsed: Duration) -> bool {
        self.timeout().is_some_and(|limit| elapsed >= limit)
    }

    /// Told before a retry whether errors of the coming attempt will be
    /// final (`true`) or retried again (`false`).
    fn set_surface_errors(&self, _surface: bool) {}
}

/// Maps a node id to the task that should run for it.
pub trait TaskProvider<T: NodeId, R: TaskOutput>: Send + Sync {
    fn provide_task(&self, id: &T) -> Arc<dyn Task<T, R>>;
}

impl<T, R, F> TaskProvider<T, R> for F
where
    T: NodeId,
    R: TaskOutput,
    F: Fn(&T) -> Arc<dyn Task<T, R>> + Send + Sync,
{
    fn provide_task(&self, id: &T) -> Arc<dyn Task<T, R>> {
        self(id)
    }
}

/// Adapter turning an async closure into a [`Task`] with default gate and
/// no timeout.
pub struct FnTask<F> {
    f: F,
}

impl<F> FnTask<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, R, F, Fut> Task<T, R> for FnTask<F>
where
    T: NodeId,
    R: TaskOutput,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    fn execute(&self) -> TaskFuture<'_, R> {
        Box::pin((self.f)())
    }
}
