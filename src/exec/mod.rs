// src/exec/mod.rs

//! Execution layer.
//!
//! Runs task attempts on bounded pools and hands their outcomes back to the
//! scheduler.
//!
//! - [`task`] is the unit-of-work contract ([`Task`], [`TaskProvider`]).
//! - [`engine`] owns the worker pools, retry timers and the result channel.
//! - [`timeout`] watches attempts that declare a timeout.
//! - [`result`] holds per-attempt and per-run result types.
//! - [`command`] provides shell-command tasks for config-driven runs.

pub mod command;
pub mod engine;
pub mod result;
pub mod task;
pub mod timeout;

pub use command::{ShellTask, ShellTaskProvider};
pub use engine::{ErrorIndex, ExecutionEngine, Pool};
pub use result::{ExecutionResult, ExecutionResults};
pub use task::{FnTask, Task, TaskFuture, TaskProvider};
