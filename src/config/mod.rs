// src/config/mod.rs

//! Configuration.
//!
//! - [`execution`] holds the programmatic per-run policy
//!   ([`ExecutionConfig`]) and pool sizing ([`EngineOptions`]).
//! - [`model`], [`loader`] and [`validate`] read and check the TOML file
//!   used by the `dagexec` binary.

pub mod duration;
pub mod execution;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use execution::{EngineOptions, ExecutionBehaviour, ExecutionConfig};
pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, RunWhen, TaskConfig};
pub use validate::graph_from_tasks;
