// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pollwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pollwatch",
    version,
    about = "Poll project directories and report files whose content changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Project roots to watch, in addition to `[[project]]` entries in the
    /// config file.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Pollwatch.toml` in the current working directory. A missing
    /// default file is not an error; built-in defaults are used instead.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Poll interval for paths given on the command line (e.g. `500ms`, `30s`).
    ///
    /// Overrides `[watcher].interval` from the config file.
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `POLLWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print each change event as a JSON object instead of a bare path.
    #[arg(long)]
    pub json: bool,

    /// Resolve config, run one baseline scan per project and print a summary
    /// without starting any watcher.
    #[arg(long)]
    pub dry_run: bool,
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

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
