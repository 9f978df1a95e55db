// src/exec/timeout.rs

//! Per-attempt timeout watching.
//!
//! Every attempt of a task that declares a timeout gets a watcher running
//! next to it. Each time the watcher wakes up it checks, in order:
//! the attempt already finished (stop), the task's timeout predicate is now
//! true (cancel the attempt and stop), otherwise sleep again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::exec::task::Task;
use crate::types::{NodeId, TaskOutput};

/// Shared bookkeeping for one in-flight attempt.
#[derive(Debug, Default)]
pub(crate) struct AttemptHandle {
    started: OnceLock<Instant>,
    finished: AtomicBool,
    cancel: CancellationToken,
}

impl AttemptHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_started(&self) {
        let _ = self.started.set(Instant::now());
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Time since the attempt body started, `None` while it waits for a permit.
    pub(crate) fn elapsed(&self) -> Option<Duration> {
        self.started.get().map(|t| t.elapsed())
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Watch `attempt` until it finishes or the task reports it timed out.
pub(crate) async fn watch<T: NodeId, R: TaskOutput>(
    id: T,
    task: Arc<dyn Task<T, R>>,
    attempt: Arc<AttemptHandle>,
    check_interval: Duration,
) {
    loop {
        let wait = match (attempt.elapsed(), task.timeout()) {
            (Some(elapsed), Some(limit)) => match limit.checked_sub(elapsed) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => check_interval,
            },
            _ => check_interval,
        };
        sleep(wait).await;

        if attempt.is_finished() {
            debug!(node = %id, "attempt finished before its timeout");
            return;
        }

        if let Some(elapsed) = attempt.elapsed() {
            if task.is_timed_out(elapsed) {
                warn!(
                    node = %id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "attempt exceeded its timeout; cancelling"
                );
                attempt.cancel();
                return;
            }
        }
    }
}
