// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::config::execution::{EngineOptions, ExecutionBehaviour, ExecutionConfig};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// behaviour = "scheduled-retry"
/// retry_count = 2
/// retry_delay = "500ms"
///
/// [task.fetch]
/// cmd = "git fetch"
///
/// [task.build]
/// cmd = "cargo build"
/// after = ["fetch"]
/// timeout = "10m"
/// ```
///
/// This is the unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Run policy and pool sizes from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// `"terminating"` (default), `"non-terminating"`, `"immediate-retry"`
    /// or `"scheduled-retry"`.
    #[serde(default)]
    pub behaviour: ExecutionBehaviour,

    /// Retries after the first attempt; only valid with a retry behaviour.
    #[serde(default)]
    pub retry_count: u32,

    /// Delay before a scheduled retry, e.g. `"500ms"`, `"2s"`.
    #[serde(default)]
    pub retry_delay: Option<String>,

    /// Size of the main worker pool. Defaults to the number of logical CPUs.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Size of the immediate-retry pool. Defaults to 2.
    #[serde(default)]
    pub retry_workers: Option<usize>,
}

/// When a task runs relative to the outcome of its `after` tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunWhen {
    /// Run whatever happened upstream.
    Always,
    /// Run only if every `after` task succeeded.
    AllParentsSucceeded,
    /// Run unless every `after` task was skipped.
    #[default]
    AnyParentRan,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute.
    pub cmd: String,

    /// Tasks that must finish before this one (`after = ["A", "B"]`).
    #[serde(default)]
    pub after: Vec<String>,

    /// Optional per-attempt timeout, e.g. `"30s"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// `false` skips the task (and whatever is reachable only through it).
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub run_when: RunWhen,
}

fn default_enabled() -> bool {
    true
}

/// A validated configuration.
///
/// Construct via `ConfigFile::try_from(RawConfigFile)` (see
/// [`crate::config::validate`]) or [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
    execution: ExecutionConfig,
    engine: EngineOptions,
    timeouts: BTreeMap<String, Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
        execution: ExecutionConfig,
        engine: EngineOptions,
        timeouts: BTreeMap<String, Duration>,
    ) -> Self {
        Self {
            config,
            task,
            execution,
            engine,
            timeouts,
        }
    }

    /// Run policy derived from `[config]`.
    pub fn execution_config(&self) -> ExecutionConfig {
        self.execution
    }

    /// Pool sizes derived from `[config]`.
    pub fn engine_options(&self) -> EngineOptions {
        self.engine
    }

    /// Parsed `timeout` of a task, if it has one.
    pub fn task_timeout(&self, name: &str) -> Option<Duration> {
        self.timeouts.get(name).copied()
    }
}
