#![allow(dead_code)]

use std::collections::BTreeMap;

use dagexec::config::{ConfigFile, ConfigSection, ExecutionBehaviour, RawConfigFile, RunWhen, TaskConfig};
use dagexec::errors::Result;
use dagexec::{DagExecutor, NodeId, TaskOutput};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_behaviour(mut self, behaviour: ExecutionBehaviour, retry_count: u32) -> Self {
        self.config.config.behaviour = behaviour;
        self.config.config.retry_count = retry_count;
        self
    }

    pub fn with_retry_delay(mut self, delay: &str) -> Self {
        self.config.config.retry_delay = Some(delay.to_string());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.config.workers = Some(workers);
        self
    }

    /// Validate into a `ConfigFile`; errors are returned for negative tests.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                after: vec![],
                timeout: None,
                enabled: true,
                run_when: RunWhen::default(),
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.task.timeout = Some(timeout.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.task.enabled = false;
        self
    }

    pub fn run_when(mut self, run_when: RunWhen) -> Self {
        self.task.run_when = run_when;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Edges of the 14-node reference graph, as `(first, after)` pairs.
///
/// ```text
/// 1 -> 2, 1 -> 3, 3 -> 4, 3 -> 5, 3 -> 6, 2 -> 7, 2 -> 9, 2 -> 8,
/// 9 -> 10, 12 -> 13, 13 -> 4, 13 -> 14, and 11 on its own.
/// ```
pub const CANONICAL_EDGES: [(u32, u32); 12] = [
    (1, 2),
    (1, 3),
    (3, 4),
    (3, 5),
    (3, 6),
    (2, 7),
    (2, 9),
    (2, 8),
    (9, 10),
    (12, 13),
    (13, 4),
    (13, 14),
];

pub const CANONICAL_INDEPENDENT: u32 = 11;

/// Add the 14-node reference graph to `executor`.
pub fn add_canonical_graph<R: TaskOutput>(executor: &mut DagExecutor<u32, R>) -> Result<()> {
    for (first, after) in CANONICAL_EDGES {
        executor.add_dependency(first, after)?;
    }
    executor.add_independent(CANONICAL_INDEPENDENT)
}

/// Add every `(first, after)` pair as an edge.
pub fn add_edges<T: NodeId, R: TaskOutput>(
    executor: &mut DagExecutor<T, R>,
    edges: &[(T, T)],
) -> Result<()> {
    for (first, after) in edges {
        executor.add_dependency(first.clone(), after.clone())?;
    }
    Ok(())
}
