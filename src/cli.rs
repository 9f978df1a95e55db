// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagexec",
    version,
    about = "Run a DAG of shell tasks with bounded parallelism and retry policies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dagexec.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Dagexec.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the DAG, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// How `--dry-run` prints the DAG.
    #[arg(long, value_enum, value_name = "FORMAT", default_value = "level")]
    pub format: GraphFormat,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Graph rendering for `--dry-run`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// One block per connected component, one line per level.
    Level,
    /// Graphviz DOT.
    Dot,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
