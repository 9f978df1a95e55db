// src/config/execution.rs

//! Per-run policy objects consumed by the scheduler and the engine.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{DagexecError, Result};

/// How a run reacts to task errors.
///
/// - `Terminating`: an error stops forward progress below the failed node,
///   and healthy sibling branches are deferred while any error is present.
/// - `NonTerminating`: errors are recorded and the run keeps expanding.
/// - `ImmediateRetryTerminating`: like `Terminating`, but failed nodes are
///   retried right away on the retry pool.
/// - `ScheduledRetryTerminating`: like `Terminating`, but failed nodes are
///   retried after `retry_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionBehaviour {
    #[default]
    Terminating,
    NonTerminating,
    #[serde(rename = "immediate-retry")]
    ImmediateRetryTerminating,
    #[serde(rename = "scheduled-retry")]
    ScheduledRetryTerminating,
}

impl FromStr for ExecutionBehaviour {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminating" => Ok(ExecutionBehaviour::Terminating),
            "non-terminating" => Ok(ExecutionBehaviour::NonTerminating),
            "immediate-retry" => Ok(ExecutionBehaviour::ImmediateRetryTerminating),
            "scheduled-retry" => Ok(ExecutionBehaviour::ScheduledRetryTerminating),
            other => Err(format!(
                "invalid behaviour: {other} (expected \"terminating\", \"non-terminating\", \"immediate-retry\" or \"scheduled-retry\")"
            )),
        }
    }
}

/// Policy for one `execute` / `recover_execution` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub behaviour: ExecutionBehaviour,
    /// Number of retries after the first attempt; 0 means no retry.
    /// Ignored unless the behaviour retries.
    pub retry_count: u32,
    /// Delay before a scheduled retry.
    pub retry_delay: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::terminating()
    }
}

impl ExecutionConfig {
    pub fn terminating() -> Self {
        Self {
            behaviour: ExecutionBehaviour::Terminating,
            retry_count: 0,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn non_terminating() -> Self {
        Self {
            behaviour: ExecutionBehaviour::NonTerminating,
            ..Self::terminating()
        }
    }

    pub fn immediate_retrying(retry_count: u32) -> Self {
        Self {
            behaviour: ExecutionBehaviour::ImmediateRetryTerminating,
            retry_count,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn scheduled_retrying(retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            behaviour: ExecutionBehaviour::ScheduledRetryTerminating,
            retry_count,
            retry_delay,
        }
    }

    pub fn is_non_terminating(&self) -> bool {
        self.behaviour == ExecutionBehaviour::NonTerminating
    }

    pub fn is_immediately_retrying(&self) -> bool {
        self.behaviour == ExecutionBehaviour::ImmediateRetryTerminating
    }

    pub fn is_scheduled_retrying(&self) -> bool {
        self.behaviour == ExecutionBehaviour::ScheduledRetryTerminating
    }

    pub fn is_retrying(&self) -> bool {
        self.is_immediately_retrying() || self.is_scheduled_retrying()
    }

    /// A retrying behaviour needs `retry_count >= 1`.
    pub fn validate(&self) -> Result<()> {
        if self.is_retrying() && self.retry_count == 0 {
            return Err(DagexecError::ConfigError(format!(
                "behaviour {:?} requires retry_count >= 1",
                self.behaviour
            )));
        }
        Ok(())
    }
}

/// Sizing of the engine's pools and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum number of task attempts running at once.
    pub workers: usize,
    /// Maximum number of retry attempts running at once.
    pub retry_workers: usize,
    /// Re-check period of a timeout watcher whose attempt has not started yet.
    pub timeout_check_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            retry_workers: 2,
            timeout_check_interval: Duration::from_millis(50),
        }
    }
}

impl EngineOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retry_workers(mut self, retry_workers: usize) -> Self {
        self.retry_workers = retry_workers;
        self
    }

    pub fn with_timeout_check_interval(mut self, interval: Duration) -> Self {
        self.timeout_check_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(DagexecError::ConfigError(
                "workers must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.retry_workers == 0 {
            return Err(DagexecError::ConfigError(
                "retry_workers must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.timeout_check_interval.is_zero() {
            return Err(DagexecError::ConfigError(
                "timeout_check_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
