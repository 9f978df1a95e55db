// src/exec/command.rs

//! Shell-command tasks built from a config file.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{ConfigFile, RunWhen};
use crate::exec::result::ExecutionResults;
use crate::exec::task::{FnTask, Task, TaskFuture, TaskProvider};

/// A `[task.<name>]` entry: runs `cmd` through the platform shell and yields
/// its trimmed stdout.
#[derive(Debug)]
pub struct ShellTask {
    name: String,
    cmd: String,
    timeout: Option<Duration>,
    enabled: bool,
    run_when: RunWhen,
    surface_errors: AtomicBool,
}

impl ShellTask {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            timeout: None,
            enabled: true,
            run_when: RunWhen::default(),
            surface_errors: AtomicBool::new(true),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_run_when(mut self, run_when: RunWhen) -> Self {
        self.run_when = run_when;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    async fn run(&self) -> anyhow::Result<String> {
        info!(task = %self.name, cmd = %self.cmd, "starting task process");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        // A cancelled attempt drops this future; the child must die with it.
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", self.name))?;

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for process of task '{}'", self.name))?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(task = %self.name, "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        info!(
            task = %self.name,
            exit_code = code,
            success = output.status.success(),
            "task process exited"
        );

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        if self.surface_errors.load(Ordering::SeqCst) {
            warn!(task = %self.name, exit_code = code, "task failed");
        } else {
            debug!(task = %self.name, exit_code = code, "task failed; will be retried");
        }
        Err(anyhow!(
            "task '{}' exited with code {}",
            self.name,
            code
        ))
    }
}

impl Task<String, String> for ShellTask {
    fn execute(&self) -> TaskFuture<'_, String> {
        Box::pin(self.run())
    }

    fn should_execute(&self, parent_results: &ExecutionResults<String, String>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.run_when {
            RunWhen::Always => true,
            RunWhen::AllParentsSucceeded => parent_results.all_successful(),
            RunWhen::AnyParentRan => !parent_results.all_skipped(),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_surface_errors(&self, surface: bool) {
        self.surface_errors.store(surface, Ordering::SeqCst);
    }
}

/// Hands out a [`ShellTask`] per configured task name.
#[derive(Debug, Clone)]
pub struct ShellTaskProvider {
    config: Arc<ConfigFile>,
}

impl ShellTaskProvider {
    pub fn new(config: Arc<ConfigFile>) -> Self {
        Self { config }
    }
}

impl TaskProvider<String, String> for ShellTaskProvider {
    fn provide_task(&self, id: &String) -> Arc<dyn Task<String, String>> {
        match self.config.task.get(id) {
            Some(tc) => Arc::new(
                ShellTask::new(id.clone(), tc.cmd.clone())
                    .with_timeout(self.config.task_timeout(id))
                    .with_enabled(tc.enabled)
                    .with_run_when(tc.run_when),
            ),
            None => {
                let name = id.clone();
                Arc::new(FnTask::new(move || {
                    let name = name.clone();
                    async move { Err::<String, _>(anyhow!("no task configured for '{name}'")) }
                }))
            }
        }
    }
}
