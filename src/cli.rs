// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdag",
    version,
    about = "Run shell jobs concurrently in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: the nearest `Taskdag.toml`, `taskdag.toml` or `.taskdag.toml`
    /// in the current directory or one of its parents.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of jobs running at once (overrides `[config]`).
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Stop starting new jobs after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Run the selected jobs without waiting for their dependencies.
    #[arg(long)]
    pub ignore_deps: bool,

    /// Only run this job (repeatable).
    #[arg(long = "job", value_name = "NAME")]
    pub job: Vec<String>,

    /// Only run jobs in this group.
    #[arg(long, value_name = "NAME")]
    pub group: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the job graph, but don't run anything.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_job_flags_accumulate() {
        let args = CliArgs::try_parse_from([
            "taskdag", "--job", "a", "--job", "b", "--max-workers", "3", "--fail-fast",
        ])
        .unwrap();

        assert_eq!(args.job, vec!["a", "b"]);
        assert_eq!(args.max_workers, Some(3));
        assert!(args.fail_fast);
        assert!(args.config.is_none());
    }
}
