// src/engine/mod.rs

//! Orchestration for dagexec.
//!
//! - [`scheduler`] holds [`DagExecutor`], the async shell that owns the graph,
//!   submits ready nodes to the execution engine and runs the wait loop.
//! - [`policy`] is the pure decision table applied to every completed attempt.
//! - [`state`] is the run bookkeeping shared with outside observers.

pub mod policy;
pub mod scheduler;
pub mod state;

pub use policy::{decide, Completion, Decision, Expansion, Retry, RetryKind};
pub use scheduler::{Continuation, DagExecutor};
pub use state::SchedulerState;
