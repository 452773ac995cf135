// src/engine/first_error.rs

use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// Collects job failures from concurrently running visits.
///
/// Only the first failure is kept in full; later ones are counted and
/// logged.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    inner: Mutex<Collected>,
}

#[derive(Debug, Default)]
struct Collected {
    first: Option<(String, String)>,
    count: usize,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure of `job`. Returns `true` if it was the first one.
    pub fn record(&self, job: &str, err: &anyhow::Error) -> bool {
        warn!(job = %job, error = %format!("{err:#}"), "job failed");

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.count += 1;
        if inner.first.is_none() {
            inner.first = Some((job.to_string(), format!("{err:#}")));
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .count
    }

    /// `(job, message)` of the first recorded failure.
    pub fn first(&self) -> Option<(String, String)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first
            .clone()
    }
}
