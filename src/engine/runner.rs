// src/engine/runner.rs

//! Runs the jobs of a config, either as a dependency-ordered bounded walk or
//! straight through the worker pool.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConfigFile, ConfigSection};
use crate::dag::{Dag, Vertex};
use crate::engine::bounded_walk::walk_bounded;
use crate::engine::first_error::ErrorCollector;
use crate::errors::{Result, TaskdagError};
use crate::exec::{JobExecutor, JobSpec};
use crate::pool::{JobId, PoolConfig, WorkerPool};

/// Which jobs of a config to run.
///
/// With no names and no group every job is selected. Otherwise a job is
/// selected if it is named in `jobs` or belongs to `group`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub jobs: Vec<String>,
    pub group: Option<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.jobs.is_empty() && self.group.is_none()
    }
}

/// How to run the selected jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub max_workers: usize,
    pub fail_fast: bool,
    /// Run every selected job at once (bounded by `max_workers`), ignoring
    /// `after` dependencies.
    pub ignore_deps: bool,
}

impl RunOptions {
    pub fn from_config(section: &ConfigSection) -> Self {
        Self {
            max_workers: section.max_workers.unwrap_or_else(default_max_workers),
            fail_fast: section.fail_fast,
            ignore_deps: false,
        }
    }
}

/// Number of CPUs, or one if that cannot be determined.
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Outcome of [`run_jobs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs never started, because of fail-fast, cancellation or a failed
    /// dependency.
    pub not_run: usize,
    /// `(job, message)` of the first failure.
    pub first_error: Option<(String, String)>,
    /// The run's token was cancelled (e.g. Ctrl-C).
    pub cancelled: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.first_error.is_none() && !self.cancelled && self.succeeded == self.total
    }

    /// Turn a report with failures into the first error.
    pub fn into_result(self) -> Result<RunReport> {
        if let Some((job, message)) = self.first_error.clone() {
            return Err(TaskdagError::JobFailed { job, message });
        }
        if self.cancelled && self.succeeded < self.total {
            return Err(TaskdagError::Cancelled);
        }
        Ok(self)
    }
}

/// Build the job graph for the selected jobs.
///
/// Edges run from a dependency to its dependent. Dependencies on jobs that
/// are not selected are dropped.
pub fn build_job_dag(cfg: &ConfigFile, selection: &Selection) -> Result<Dag<JobSpec>> {
    for name in &selection.jobs {
        if !cfg.job.contains_key(name) {
            return Err(TaskdagError::JobNotFound(name.clone()));
        }
    }

    let selected: BTreeSet<&str> = cfg
        .job
        .iter()
        .filter(|(name, job)| {
            selection.is_all()
                || selection.jobs.iter().any(|j| j == *name)
                || selection.group.as_deref().is_some_and(|g| job.in_group(g))
        })
        .map(|(name, _)| name.as_str())
        .collect();

    if selected.is_empty() {
        return Err(TaskdagError::ConfigError(match &selection.group {
            Some(group) => format!("no jobs in group '{group}'"),
            None => "no jobs selected".to_string(),
        }));
    }

    let dag = Dag::new();
    for name in &selected {
        dag.add_vertex(*name, JobSpec::from_config(name, &cfg.job[*name], cfg))?;
    }
    for name in &selected {
        for dep in &cfg.job[*name].after {
            if selected.contains(dep.as_str()) {
                dag.add_edge(dep, name)?;
            } else {
                debug!(job = %name, dependency = %dep, "dependency not selected; dropping edge");
            }
        }
    }

    info!(jobs = dag.len(), edges = dag.edge_count(), "job graph built");
    Ok(dag)
}

/// Run every job of `dag` with `executor`.
///
/// In ordered mode a job starts only after all its dependencies finished;
/// a failed job still counts as finished for ordering. With fail-fast, the
/// first failure stops further jobs from starting while running ones are
/// left to finish. Cancelling `cancel` stops new jobs and is passed to the
/// running ones.
pub async fn run_jobs(
    dag: &Dag<JobSpec>,
    executor: Arc<dyn JobExecutor>,
    options: RunOptions,
    cancel: CancellationToken,
) -> RunReport {
    info!(
        jobs = dag.len(),
        max_workers = options.max_workers,
        fail_fast = options.fail_fast,
        ignore_deps = options.ignore_deps,
        "starting run"
    );

    let report = if options.ignore_deps {
        run_unordered(dag, executor, options, cancel).await
    } else {
        run_ordered(dag, executor, options, cancel).await
    };

    if report.is_success() {
        info!(succeeded = report.succeeded, "all jobs succeeded");
    } else {
        warn!(
            succeeded = report.succeeded,
            failed = report.failed,
            not_run = report.not_run,
            cancelled = report.cancelled,
            "run finished with problems"
        );
    }
    report
}

async fn run_ordered(
    dag: &Dag<JobSpec>,
    executor: Arc<dyn JobExecutor>,
    options: RunOptions,
    cancel: CancellationToken,
) -> RunReport {
    // Fail-fast only stops dispatch; running jobs keep the outer token.
    let walk_token = cancel.child_token();
    let errors = Arc::new(ErrorCollector::new());
    let succeeded = Arc::new(AtomicUsize::new(0));

    let visit = {
        let errors = Arc::clone(&errors);
        let succeeded = Arc::clone(&succeeded);
        let job_token = cancel.clone();
        let walk_token = walk_token.clone();
        let fail_fast = options.fail_fast;

        move |vertex: Vertex<JobSpec>, _: CancellationToken| {
            let executor = Arc::clone(&executor);
            let errors = Arc::clone(&errors);
            let succeeded = Arc::clone(&succeeded);
            let job_token = job_token.clone();
            let walk_token = walk_token.clone();

            async move {
                let job = vertex.value;
                match executor.run(&job, job_token).await {
                    Ok(()) => {
                        succeeded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        if errors.record(&job.name, &err) && fail_fast {
                            info!(job = %job.name, "fail-fast: no further jobs will be started");
                            walk_token.cancel();
                        }
                    }
                }
            }
        }
    };

    let summary = walk_bounded(walk_token, dag, options.max_workers, visit).await;

    let succeeded = succeeded.load(Ordering::Relaxed);
    let failed = errors.count();
    RunReport {
        total: summary.total,
        succeeded,
        failed,
        not_run: summary.total.saturating_sub(succeeded + failed),
        first_error: errors.first(),
        cancelled: cancel.is_cancelled(),
    }
}

async fn run_unordered(
    dag: &Dag<JobSpec>,
    executor: Arc<dyn JobExecutor>,
    options: RunOptions,
    cancel: CancellationToken,
) -> RunReport {
    let (mut pool, results) = WorkerPool::<()>::new(
        PoolConfig::new(options.max_workers, options.fail_fast),
        cancel.clone(),
    );
    let drained = tokio::spawn(results.drain());

    let mut names: HashMap<JobId, String> = HashMap::new();
    for id in dag.vertex_ids() {
        let Some(job) = dag.vertex(id.as_str()) else {
            continue;
        };
        let executor = Arc::clone(&executor);
        let job_token = cancel.clone();
        let name = job.name.clone();

        match pool
            .submit(move || async move { executor.run(&job, job_token).await })
            .await
        {
            Ok(job_id) => {
                names.insert(job_id, name);
            }
            Err(err) => warn!(job = %name, error = %err, "could not submit job"),
        }
    }

    pool.close().await;

    let report = match drained.await {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "result collector ended abnormally");
            Default::default()
        }
    };

    let first_error = report.first_error.as_ref().map(|(id, err)| {
        let job = names.get(id).cloned().unwrap_or_else(|| id.to_string());
        (job, err.to_string())
    });

    RunReport {
        total: dag.len(),
        succeeded: report.succeeded,
        failed: report.failed,
        not_run: report.skipped,
        first_error,
        cancelled: cancel.is_cancelled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JobConfig, RawConfigFile};

    fn config() -> ConfigFile {
        let mut raw = RawConfigFile::default();
        let mut add = |name: &str, groups: &[&str], after: &[&str]| {
            raw.job.insert(
                name.to_string(),
                JobConfig {
                    cmd: format!("echo {name}"),
                    dir: None,
                    groups: groups.iter().map(|s| s.to_string()).collect(),
                    after: after.iter().map(|s| s.to_string()).collect(),
                },
            );
        };
        add("fetch", &["net"], &[]);
        add("build", &[], &["fetch"]);
        add("test", &["ci"], &["build"]);
        ConfigFile::try_from(raw).unwrap()
    }

    #[test]
    fn selecting_all_keeps_every_edge() {
        let dag = build_job_dag(&config(), &Selection::all()).unwrap();
        assert_eq!(dag.len(), 3);
        assert_eq!(dag.edge_count(), 2);
    }

    #[test]
    fn edges_to_unselected_jobs_are_dropped() {
        let selection = Selection {
            jobs: vec!["build".into()],
            group: Some("ci".into()),
        };
        let dag = build_job_dag(&config(), &selection).unwrap();

        assert_eq!(dag.vertex_ids().len(), 2);
        assert!(!dag.contains("fetch"));
        assert_eq!(dag.edge_count(), 1);
    }

    #[test]
    fn unknown_job_name_is_an_error() {
        let selection = Selection {
            jobs: vec!["deploy".into()],
            group: None,
        };
        let err = build_job_dag(&config(), &selection).unwrap_err();
        assert!(matches!(err, TaskdagError::JobNotFound(name) if name == "deploy"));
    }

    #[test]
    fn empty_group_is_an_error() {
        let selection = Selection {
            jobs: Vec::new(),
            group: Some("nobody".into()),
        };
        assert!(build_job_dag(&config(), &selection).is_err());
    }

    #[test]
    fn report_surfaces_first_error() {
        let report = RunReport {
            total: 2,
            succeeded: 1,
            failed: 1,
            first_error: Some(("b".into(), "boom".into())),
            ..Default::default()
        };
        match report.into_result() {
            Err(TaskdagError::JobFailed { job, message }) => {
                assert_eq!(job, "b");
                assert_eq!(message, "boom");
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }
}
