// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `lifeline`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lifeline",
    version,
    about = "Run a service until it finishes, fails, or is asked to stop.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to an optional config file (TOML).
    ///
    /// Without it, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LIFELINE_LOG`, then `[log].level`, then `debug` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Number of runtime worker threads. Overrides the config file and the
    /// CPU quota.
    #[arg(long, value_name = "N")]
    pub worker_threads: Option<usize>,

    /// Print the resolved configuration and worker sizing, then exit.
    #[arg(long)]
    pub print_config: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
