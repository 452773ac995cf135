// src/pool/worker_pool.rs

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pool::job::{JobError, JobFuture, JobId, JobResult, JobResults, QueuedJob};

/// Sizing and failure policy of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers, and so the maximum number of jobs running at once.
    /// Zero is treated as one.
    pub max_workers: usize,
    /// Stop starting queued jobs once any job has failed.
    pub fail_fast: bool,
}

impl PoolConfig {
    pub fn new(max_workers: usize, fail_fast: bool) -> Self {
        Self {
            max_workers,
            fail_fast,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,
}

/// State shared by every worker of one pool.
#[derive(Debug)]
struct Shared {
    fail_fast: bool,
    failed: AtomicBool,
    cancel: CancellationToken,
}

/// A fixed set of workers pulling jobs from one queue.
///
/// At most `max_workers` jobs run at any moment. Every submitted job yields
/// exactly one [`JobResult`] on the [`JobResults`] stream returned by
/// [`WorkerPool::new`], in completion order:
///
/// - a job that ran produces its value or [`JobError::Failed`] /
///   [`JobError::Panicked`];
/// - with `fail_fast`, jobs dequeued after a failure are dropped unrun and
///   report [`JobError::NotRun`]; jobs already running are left alone;
/// - jobs dequeued after `cancel` fires report [`JobError::Cancelled`].
///
/// Failed jobs are never retried.
pub struct WorkerPool<T> {
    jobs_tx: Option<mpsc::Sender<QueuedJob<T>>>,
    workers: Vec<JoinHandle<()>>,
    next_id: AtomicU64,
    shared: Arc<Shared>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Start the workers and return the pool with its result stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: PoolConfig, cancel: CancellationToken) -> (Self, JobResults<T>) {
        let max_workers = config.max_workers.max(1);

        let (jobs_tx, jobs_rx) = mpsc::channel::<QueuedJob<T>>(max_workers);
        let (results_tx, results_rx) = mpsc::channel::<JobResult<T>>(max_workers);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));

        let shared = Arc::new(Shared {
            fail_fast: config.fail_fast,
            failed: AtomicBool::new(false),
            cancel,
        });

        let workers = (1..=max_workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&jobs_rx),
                    results_tx.clone(),
                    Arc::clone(&shared),
                ))
            })
            .collect();

        info!(max_workers, fail_fast = config.fail_fast, "worker pool started");

        let pool = Self {
            jobs_tx: Some(jobs_tx),
            workers,
            next_id: AtomicU64::new(0),
            shared,
        };
        (pool, JobResults::new(results_rx))
    }

    /// Queue a job.
    ///
    /// Waits while the queue is full and every worker is busy. Jobs are
    /// accepted even after a fail-fast failure; they are then reported as
    /// [`JobError::NotRun`].
    pub async fn submit<F, Fut>(&self, job: F) -> Result<JobId, PoolError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let tx = self.jobs_tx.as_ref().ok_or(PoolError::Closed)?;
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let queued = QueuedJob {
            id,
            run: Box::new(move || -> JobFuture<T> { Box::pin(job()) }),
        };

        tx.send(queued).await.map_err(|_| PoolError::Closed)?;
        debug!(%id, "job queued");
        Ok(id)
    }

    /// Whether a job has failed while fail-fast is on.
    pub fn has_failed(&self) -> bool {
        self.shared.failed.load(Ordering::Acquire)
    }

    /// Stop accepting jobs and wait for the queue to drain.
    ///
    /// Once this returns the result stream has received every result and
    /// ends. The stream must be read concurrently, or workers waiting to
    /// publish will never finish.
    pub async fn close(&mut self) {
        if self.jobs_tx.take().is_some() {
            debug!("worker pool closed for new jobs");
        }
        self.wait().await;
    }

    /// Wait for every worker to exit.
    ///
    /// Workers only exit after [`close`](Self::close) (or after the pool is
    /// dropped), so on an open pool this waits until it is closed elsewhere.
    pub async fn wait(&mut self) {
        for handle in self.workers.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "worker task ended abnormally");
            }
        }
    }
}

async fn worker_loop<T: Send + 'static>(
    worker_id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<QueuedJob<T>>>>,
    results: mpsc::Sender<JobResult<T>>,
    shared: Arc<Shared>,
) {
    debug!(worker_id, "worker started");

    loop {
        // Only one idle worker waits on the queue at a time; the lock is
        // released as soon as a job is taken.
        let next = {
            let mut rx = jobs.lock().await;
            rx.recv().await
        };
        let Some(QueuedJob { id, run }) = next else {
            break;
        };

        let outcome = if shared.cancel.is_cancelled() {
            debug!(worker_id, %id, "pool cancelled; skipping job");
            Err(JobError::Cancelled)
        } else if shared.fail_fast && shared.failed.load(Ordering::Acquire) {
            debug!(worker_id, %id, "earlier job failed; skipping job");
            Err(JobError::NotRun)
        } else {
            debug!(worker_id, %id, "running job");
            execute(run).await
        };

        if let Err(err) = &outcome {
            if err.ran() {
                warn!(worker_id, %id, error = %err, "job failed");
                if shared.fail_fast && !shared.failed.swap(true, Ordering::AcqRel) {
                    info!(%id, "fail-fast: no further jobs will be started");
                }
            }
        }

        if results.send(JobResult { id, outcome }).await.is_err() {
            debug!(worker_id, %id, "result stream dropped; discarding result");
        }
    }

    debug!(worker_id, "worker finished (queue closed)");
}

/// Run a job on its own task so a panic is reported instead of taking the
/// worker down with it.
async fn execute<T: Send + 'static>(
    run: Box<dyn FnOnce() -> JobFuture<T> + Send>,
) -> Result<T, JobError> {
    match tokio::spawn(run()).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(JobError::Failed(err)),
        Err(join_err) if join_err.is_panic() => {
            let payload = join_err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(JobError::Panicked(message))
        }
        Err(_) => Err(JobError::Cancelled),
    }
}
