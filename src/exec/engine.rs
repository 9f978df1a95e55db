// src/exec/engine.rs

//! Execution engine: runs submitted tasks on bounded pools and hands
//! completed attempts back one at a time.
//!
//! - The main pool and the retry pool are `Semaphore`s over the Tokio
//!   runtime; an attempt holds a permit for as long as its body runs.
//! - Scheduled retries and timeout watchers live on `tokio::time`.
//! - Every spawned attempt, retry timer and watcher is owned by a single
//!   `JoinSet`, so [`ExecutionEngine::shutdown`] stops all of them at once.
//! - Completed attempts are delivered over an unbounded mpsc channel and
//!   consumed by [`ExecutionEngine::process_result`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::EngineOptions;
use crate::errors::{DagexecError, Result};
use crate::exec::result::ExecutionResult;
use crate::exec::task::Task;
use crate::exec::timeout::{self, AttemptHandle};
use crate::types::{NodeId, TaskOutput};

/// Ids currently in error, with the failing attempt's result.
///
/// Written from attempt tasks, read by the scheduler.
pub type ErrorIndex<T, R> = Arc<DashMap<T, ExecutionResult<T, R>>>;

/// Which pool an attempt runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Workers,
    Retry,
}

pub struct ExecutionEngine<T: NodeId, R: TaskOutput> {
    options: EngineOptions,
    workers: Arc<Semaphore>,
    retry_workers: Arc<Semaphore>,
    running: JoinSet<()>,
    results_tx: mpsc::UnboundedSender<ExecutionResult<T, R>>,
    results_rx: mpsc::UnboundedReceiver<ExecutionResult<T, R>>,
    errored: ErrorIndex<T, R>,
    shut_down: bool,
}

impl<T: NodeId, R: TaskOutput> std::fmt::Debug for ExecutionEngine<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("options", &self.options)
            .field("in_flight", &self.running.len())
            .field("errored", &self.errored.len())
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

impl<T: NodeId, R: TaskOutput> ExecutionEngine<T, R> {
    /// Create an engine whose attempts report errors into `errored`.
    ///
    /// Must be called from within a Tokio runtime before anything is submitted.
    pub fn new(options: EngineOptions, errored: ErrorIndex<T, R>) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            options,
            workers: Arc::new(Semaphore::new(options.workers)),
            retry_workers: Arc::new(Semaphore::new(options.retry_workers)),
            running: JoinSet::new(),
            results_tx,
            results_rx,
            errored,
            shut_down: false,
        }
    }

    /// Enqueue a first attempt on the main pool. Returns immediately.
    pub fn submit(&mut self, id: T, task: Arc<dyn Task<T, R>>) -> Result<()> {
        self.spawn_attempt(id, task, Pool::Workers, None)
    }

    /// Enqueue a retry on the retry pool, starting as soon as a permit is free.
    pub fn submit_immediate_retry(&mut self, id: T, task: Arc<dyn Task<T, R>>) -> Result<()> {
        self.spawn_attempt(id, task, Pool::Retry, None)
    }

    /// Enqueue a retry on the retry pool after `delay`.
    pub fn submit_scheduled_retry(
        &mut self,
        id: T,
        task: Arc<dyn Task<T, R>>,
        delay: Duration,
    ) -> Result<()> {
        self.spawn_attempt(id, task, Pool::Retry, Some(delay))
    }

    /// Wait for the next completed attempt of any in-flight task.
    pub async fn process_result(&mut self) -> Result<ExecutionResult<T, R>> {
        let result = self
            .results_rx
            .recv()
            .await
            .ok_or(DagexecError::EngineClosed)?;
        self.reap_finished();
        Ok(result)
    }

    /// Take every result that has already been delivered, without waiting.
    pub fn drain_completed(&mut self) -> Vec<ExecutionResult<T, R>> {
        let mut drained = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            drained.push(result);
        }
        drained
    }

    /// Whether any task is in error right now. Best effort: the index can
    /// change while the caller acts on the answer.
    pub fn is_any_task_in_error(&self) -> bool {
        !self.errored.is_empty()
    }

    /// Number of spawned attempts, retry timers and watchers not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Abort every in-flight attempt, pending retry and watcher.
    ///
    /// Results already delivered stay available to [`Self::drain_completed`].
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        info!(in_flight = self.running.len(), "shutting down execution engine");
        self.shut_down = true;
        self.workers.close();
        self.retry_workers.close();
        self.running.abort_all();
    }

    fn spawn_attempt(
        &mut self,
        id: T,
        task: Arc<dyn Task<T, R>>,
        pool: Pool,
        delay: Option<Duration>,
    ) -> Result<()> {
        if self.shut_down {
            return Err(DagexecError::EngineClosed);
        }
        self.reap_finished();

        let handle = Arc::new(AttemptHandle::new());

        if task.timeout().is_some() {
            self.running.spawn(timeout::watch(
                id.clone(),
                Arc::clone(&task),
                Arc::clone(&handle),
                self.options.timeout_check_interval,
            ));
        }

        let permits = match pool {
            Pool::Workers => Arc::clone(&self.workers),
            Pool::Retry => Arc::clone(&self.retry_workers),
        };

        debug!(node = %id, ?pool, ?delay, "submitting attempt");

        self.running.spawn(run_attempt(Attempt {
            id,
            task,
            handle,
            permits,
            delay,
            results_tx: self.results_tx.clone(),
            errored: Arc::clone(&self.errored),
        }));

        Ok(())
    }

    /// Drop bookkeeping for finished join handles.
    fn reap_finished(&mut self) {
        while let Some(joined) = self.running.try_join_next() {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!(error = %e, "attempt task panicked");
                }
            }
        }
    }
}

/// Everything a spawned attempt needs, moved into its Tokio task.
struct Attempt<T: NodeId, R: TaskOutput> {
    id: T,
    task: Arc<dyn Task<T, R>>,
    handle: Arc<AttemptHandle>,
    permits: Arc<Semaphore>,
    delay: Option<Duration>,
    results_tx: mpsc::UnboundedSender<ExecutionResult<T, R>>,
    errored: ErrorIndex<T, R>,
}

/// Run one attempt and report its outcome.
///
/// A timed-out attempt is reported as `Cancelled` and never enters the error
/// index; a successful attempt clears any earlier error for the same id.
/// A panicking task body is reported as `Errored`.
async fn run_attempt<T: NodeId, R: TaskOutput>(attempt: Attempt<T, R>) {
    let Attempt {
        id,
        task,
        handle,
        permits,
        delay,
        results_tx,
        errored,
    } = attempt;

    if let Some(delay) = delay {
        sleep(delay).await;
    }

    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            debug!(node = %id, "pool closed before attempt could start");
            return;
        }
    };

    let started_at = Utc::now();
    handle.mark_started();
    debug!(node = %id, "attempt started");

    // `execute` itself is called inside the guarded future so a panic while
    // building the future is caught too.
    let body = AssertUnwindSafe(async { task.execute().await }).catch_unwind();
    let outcome = tokio::select! {
        res = body => Some(res.unwrap_or_else(|payload| {
            Err(anyhow::anyhow!("task panicked: {}", panic_message(payload.as_ref())))
        })),
        _ = handle.cancellation().cancelled() => None,
    };

    handle.mark_finished();
    let ended_at = Utc::now();

    let result = match outcome {
        Some(Ok(value)) => {
            errored.remove(&id);
            info!(node = %id, "task succeeded");
            ExecutionResult::success(id, value, started_at, ended_at)
        }
        Some(Err(err)) => {
            let message = format!("{err:#}");
            warn!(node = %id, error = %message, "task failed");
            let result = ExecutionResult::errored(id.clone(), message, started_at, ended_at);
            errored.insert(id, result.clone());
            result
        }
        None => {
            let message = match task.timeout() {
                Some(limit) => format!("timed out after {limit:?}"),
                None => "cancelled".to_string(),
            };
            warn!(node = %id, reason = %message, "task attempt cancelled");
            ExecutionResult::cancelled(id, message, started_at, ended_at)
        }
    };

    if results_tx.send(result).is_err() {
        debug!("result receiver dropped; discarding attempt result");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
