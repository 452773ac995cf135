use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use taskdag::exec::{ExecFuture, JobExecutor, JobSpec};
use tokio_util::sync::CancellationToken;

use crate::probe::ConcurrencyProbe;

/// A fake executor that:
/// - records the order in which jobs started and finished
/// - optionally sleeps for each job, giving other jobs a chance to overlap
/// - fails the jobs it was told to fail
/// - never spawns a process.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    started: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<Vec<String>>>,
    failing: Arc<HashSet<String>>,
    delay: Option<Duration>,
    probe: ConcurrencyProbe,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, jobs: &[&str]) -> Self {
        self.failing = Arc::new(jobs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn probe(&self) -> &ConcurrencyProbe {
        &self.probe
    }
}

impl JobExecutor for RecordingExecutor {
    fn run<'a>(&'a self, job: &'a JobSpec, cancel: CancellationToken) -> ExecFuture<'a> {
        Box::pin(async move {
            let _running = self.probe.enter();
            self.started.lock().unwrap().push(job.name.clone());

            if let Some(delay) = self.delay {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => bail!("job '{}' cancelled", job.name),
                }
            }

            self.finished.lock().unwrap().push(job.name.clone());

            if self.failing.contains(&job.name) {
                bail!("job '{}' failed on purpose", job.name);
            }
            Ok(())
        })
    }
}
