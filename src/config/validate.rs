// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::execution::{EngineOptions, ExecutionConfig};
use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile};
use crate::dag::{validate_acyclic, Graph};
use crate::errors::{DagexecError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagexecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        let execution = execution_config(&raw.config)?;
        let engine = engine_options(&raw.config)?;
        let timeouts = task_timeouts(&raw)?;
        validate_task_dependencies(&raw)?;
        validate_dag(&raw)?;

        Ok(ConfigFile::new_unchecked(
            raw.config, raw.task, execution, engine, timeouts,
        ))
    }
}

/// Build the dependency graph described by a config's `after` lists.
///
/// Edge direction: dependency -> task. For `[task.B] after = ["A"]` we add
/// `A -> B`. Tasks are inserted in name order.
pub fn graph_from_tasks<R>(task: &BTreeMap<String, crate::config::TaskConfig>) -> Graph<String, R> {
    let mut graph = Graph::new();
    for (name, tc) in task.iter() {
        graph.add_independent(name.clone());
        for dep in tc.after.iter() {
            graph.add_dependency(dep.clone(), name.clone());
        }
    }
    graph
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DagexecError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn execution_config(section: &ConfigSection) -> Result<ExecutionConfig> {
    let retry_delay = match section.retry_delay {
        Some(ref s) => parse_config_duration("[config].retry_delay", s)?,
        None => Duration::ZERO,
    };

    let execution = ExecutionConfig {
        behaviour: section.behaviour,
        retry_count: section.retry_count,
        retry_delay,
    };
    execution.validate()?;
    if !execution.is_retrying() && execution.retry_count > 0 {
        warn!(
            retry_count = execution.retry_count,
            behaviour = ?execution.behaviour,
            "retry_count is ignored for a behaviour that does not retry"
        );
    }
    Ok(execution)
}

fn engine_options(section: &ConfigSection) -> Result<EngineOptions> {
    let mut options = EngineOptions::default();
    if let Some(workers) = section.workers {
        options = options.with_workers(workers);
    }
    if let Some(retry_workers) = section.retry_workers {
        options = options.with_retry_workers(retry_workers);
    }
    options.validate()?;
    Ok(options)
}

fn task_timeouts(cfg: &RawConfigFile) -> Result<BTreeMap<String, Duration>> {
    let mut timeouts = BTreeMap::new();
    for (name, task) in cfg.task.iter() {
        if let Some(ref s) = task.timeout {
            let field = format!("[task.{name}].timeout");
            let timeout = parse_config_duration(&field, s)?;
            if timeout.is_zero() {
                return Err(DagexecError::ConfigError(format!(
                    "{field} must be non-zero"
                )));
            }
            timeouts.insert(name.clone(), timeout);
        }
    }
    Ok(timeouts)
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(DagexecError::UnknownTask(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let graph: Graph<String, ()> = graph_from_tasks(&cfg.task);
    validate_acyclic(&graph)
}

fn parse_config_duration(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| DagexecError::ConfigError(format!("{field}: {e}")))
}
