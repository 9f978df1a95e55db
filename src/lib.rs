// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, GraphFormat};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;

pub use crate::config::{EngineOptions, ExecutionBehaviour, ExecutionConfig};
pub use crate::dag::{DotTraversar, Graph, LevelOrderTraversar, Node, Traversar};
pub use crate::engine::{DagExecutor, SchedulerState};
pub use crate::errors::DagexecError;
pub use crate::exec::{
    ExecutionEngine, ExecutionResult, ExecutionResults, FnTask, ShellTask, ShellTaskProvider, Task,
    TaskFuture, TaskProvider,
};
pub use crate::types::{ExecutionStatus, NodeId, Phase, TaskOutput};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, then either prints the DAG (`--dry-run`)
/// or runs it, printing one line per task to stdout. Ctrl-C stops the run
/// after the next completed attempt.
///
/// Returns `Ok(false)` when a task errored or was cancelled, or the run was
/// stopped before finishing.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let cfg = Arc::new(load_and_validate(&config_path)?);
    let mut executor = build_executor(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &executor, args.format)?;
        return Ok(true);
    }

    let stop_requested = Arc::new(AtomicBool::new(false));
    {
        let stop_requested = Arc::clone(&stop_requested);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("Ctrl+C received; stopping after the next completed task");
            stop_requested.store(true, Ordering::SeqCst);
        });
    }
    executor.set_continuation(move || !stop_requested.load(Ordering::SeqCst));

    let config = cfg.execution_config();
    info!(tasks = cfg.task.len(), behaviour = ?config.behaviour, "running DAG");

    match executor.execute(config).await {
        Ok(results) => {
            print_results(&executor);
            Ok(!results.has_any_error() && results.cancelled().is_empty())
        }
        Err(DagexecError::ForcedStop) => {
            print_results(&executor);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Build a shell-task executor for every `[task.<name>]` of `cfg`.
///
/// Edge direction: dependency -> task, so `[task.B] after = ["A"]` adds
/// `A -> B`.
pub fn build_executor(cfg: &Arc<ConfigFile>) -> errors::Result<DagExecutor<String, String>> {
    let mut executor = DagExecutor::new(ShellTaskProvider::new(Arc::clone(cfg)))
        .with_options(cfg.engine_options());

    for (name, task) in cfg.task.iter() {
        executor.add_independent(name.clone())?;
        for dep in task.after.iter() {
            executor.add_dependency(dep.clone(), name.clone())?;
        }
    }
    Ok(executor)
}

fn print_dry_run(
    cfg: &ConfigFile,
    executor: &DagExecutor<String, String>,
    format: GraphFormat,
) -> Result<()> {
    let mut rendered = String::new();
    match format {
        GraphFormat::Level => executor.print(&LevelOrderTraversar, &mut rendered)?,
        GraphFormat::Dot => executor.print(&DotTraversar, &mut rendered)?,
    }

    if format == GraphFormat::Level {
        let config = cfg.execution_config();
        let options = cfg.engine_options();
        println!("dagexec dry-run");
        println!("  config.behaviour = {:?}", config.behaviour);
        println!("  config.retry_count = {}", config.retry_count);
        println!("  config.retry_delay = {:?}", config.retry_delay);
        println!("  config.workers = {}", options.workers);
        println!("  config.retry_workers = {}", options.retry_workers);
        println!();
    }
    print!("{rendered}");

    debug!("dry-run complete (no execution)");
    Ok(())
}

/// `<id>\t<status>\t<attempts>\t<message>`, in config order. Tasks the run
/// never reached show as `not-run`.
fn print_results(executor: &DagExecutor<String, String>) {
    for node in executor.graph().nodes() {
        let status = node
            .status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "not-run".to_string());
        println!(
            "{}\t{}\t{}\t{}",
            node.id(),
            status,
            node.attempts(),
            node.message().unwrap_or("")
        );
    }
}
