// src/pool/job.rs

//! Job and result types for the worker pool.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Sequence number assigned to a job when it is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Why a job produced no value.
#[derive(Debug, Error)]
pub enum JobError {
    /// Skipped because an earlier job failed and the pool is fail-fast.
    #[error("not run: an earlier job failed")]
    NotRun,

    /// Skipped because the pool's cancellation token fired.
    #[error("not run: cancelled")]
    Cancelled,

    /// The job panicked while running.
    #[error("job panicked: {0}")]
    Panicked(String),

    /// The job ran and returned an error.
    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl JobError {
    /// Whether the job actually ran (as opposed to being skipped).
    pub fn ran(&self) -> bool {
        matches!(self, JobError::Failed(_) | JobError::Panicked(_))
    }
}

/// One result per submitted job, published as the job finishes.
#[derive(Debug)]
pub struct JobResult<T> {
    pub id: JobId,
    pub outcome: Result<T, JobError>,
}

impl<T> JobResult<T> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn err(&self) -> Option<&JobError> {
        self.outcome.as_ref().err()
    }
}

pub(crate) type JobFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

/// A job waiting in the queue.
pub(crate) struct QueuedJob<T> {
    pub(crate) id: JobId,
    pub(crate) run: Box<dyn FnOnce() -> JobFuture<T> + Send>,
}

/// The stream of [`JobResult`]s produced by a pool.
///
/// Ends once the pool is closed and every queued job has been accounted for.
/// Workers wait for this stream to be read, so drain it concurrently with
/// submitting and closing.
#[derive(Debug)]
pub struct JobResults<T> {
    rx: mpsc::Receiver<JobResult<T>>,
}

impl<T> JobResults<T> {
    pub(crate) fn new(rx: mpsc::Receiver<JobResult<T>>) -> Self {
        Self { rx }
    }

    /// Next finished job, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<JobResult<T>> {
        self.rx.recv().await
    }

    /// Read every remaining result, keeping only the first error.
    pub async fn drain(mut self) -> DrainReport {
        let mut report = DrainReport::default();

        while let Some(result) = self.recv().await {
            report.record(result);
        }

        debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "result stream drained"
        );
        report
    }
}

/// Tally of a drained result stream.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub succeeded: usize,
    /// Jobs that ran and failed (including panics).
    pub failed: usize,
    /// Jobs skipped by fail-fast or cancellation.
    pub skipped: usize,
    /// The first error seen, with the job it came from. An error from a job
    /// that ran takes precedence over a skip notice.
    pub first_error: Option<(JobId, JobError)>,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    fn record<T>(&mut self, result: JobResult<T>) {
        match result.outcome {
            Ok(_) => self.succeeded += 1,
            Err(err) => {
                let ran = err.ran();
                if ran {
                    self.failed += 1;
                } else {
                    self.skipped += 1;
                }

                let replace = match &self.first_error {
                    None => true,
                    Some((_, existing)) => ran && !existing.ran(),
                };
                if replace {
                    self.first_error = Some((result.id, err));
                }
            }
        }
    }
}
