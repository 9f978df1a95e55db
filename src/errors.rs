// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagexecError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Cycle detected in DAG: edge '{from}' -> '{to}' closes a cycle")]
    DagCycle { from: String, to: String },

    #[error("Graph can no longer be modified once execution has started")]
    GraphFrozen,

    #[error("Execution is already running")]
    AlreadyRunning,

    #[error("Execution has already terminated")]
    AlreadyTerminated,

    #[error("Nothing to recover: execution was never started")]
    NotStarted,

    #[error("Execution was forcibly stopped")]
    ForcedStop,

    #[error("Execution engine result channel closed")]
    EngineClosed,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagexecError {
    /// Build a cycle error for the edge `from -> to`.
    pub fn cycle(from: impl ToString, to: impl ToString) -> Self {
        Self::DagCycle {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagexecError>;
