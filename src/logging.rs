// src/logging.rs

//! Logging setup for `dagexec` using `tracing` + `tracing-subscriber`.
//!
//! Filter priority:
//! 1. `--log-level` CLI flag (applies to every target)
//! 2. `DAGEXEC_LOG` environment variable, any `EnvFilter` directive
//!    (e.g. `"info"`, `"dagexec::engine=debug,warn"`)
//! 3. default to `info`
//!
//! Logs go to STDERR; STDOUT carries the per-task result table.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "DAGEXEC_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(directive_for(lvl)),
        None => EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

fn directive_for(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
