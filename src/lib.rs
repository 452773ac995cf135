// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pool;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, resolve_config_path, ConfigFile};
use crate::dag::Dag;
use crate::engine::{build_job_dag, run_jobs, RunOptions, Selection};
use crate::exec::{JobSpec, ShellExecutor};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds the job graph for the selected jobs and runs it
/// with the shell executor. Ctrl-C cancels the run. Returns the first job
/// failure as an error.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref())?;
    info!(path = %config_path.display(), "using config");
    let cfg = load_and_validate(&config_path)?;

    let selection = Selection {
        jobs: args.job.clone(),
        group: args.group.clone(),
    };
    let dag = build_job_dag(&cfg, &selection)?;
    let options = run_options(&cfg, &args);

    if args.dry_run {
        print_dry_run(&cfg, &dag, &options);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; cancelling run");
            cancel.cancel();
        });
    }

    let report = run_jobs(&dag, Arc::new(ShellExecutor::new()), options, cancel).await;
    report.into_result()?;
    Ok(())
}

/// `[config]` values, overridden by CLI flags.
fn run_options(cfg: &ConfigFile, args: &CliArgs) -> RunOptions {
    let mut options = RunOptions::from_config(&cfg.config);
    if let Some(n) = args.max_workers {
        options.max_workers = n;
    }
    options.fail_fast |= args.fail_fast;
    options.ignore_deps = args.ignore_deps;
    options
}

fn print_dry_run(cfg: &ConfigFile, dag: &Dag<JobSpec>, options: &RunOptions) {
    println!("taskdag dry-run");
    println!("  max_workers = {}", options.max_workers);
    println!("  fail_fast = {}", options.fail_fast);
    println!("  ignore_deps = {}", options.ignore_deps);
    println!();

    println!("jobs ({}):", dag.len());
    for id in dag.vertex_ids() {
        let Some(job) = dag.vertex(id.as_str()) else {
            continue;
        };
        println!("  - {}", job.name);
        println!("      cmd: {}", job.cmd);
        if let Some(dir) = &job.dir {
            println!("      dir: {}", dir.display());
        }
        if let Some(cfg_job) = cfg.job.get(&job.name) {
            if !cfg_job.groups.is_empty() {
                println!("      groups: {:?}", cfg_job.groups);
            }
        }
        if let Ok(parents) = dag.parents(id.as_str()) {
            if !parents.is_empty() {
                let after: Vec<&str> = parents.iter().map(|p| p.as_str()).collect();
                println!("      after: {:?}", after);
            }
        }
    }
    println!();
    println!("{dag}");

    debug!("dry-run complete (no execution)");
}
