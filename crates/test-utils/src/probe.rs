use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Tracks how many units of work run at once and the highest value seen.
#[derive(Debug, Default, Clone)]
pub struct ConcurrencyProbe {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one unit as running until the guard is dropped.
    pub fn enter(&self) -> ProbeGuard {
        let now = self.inner.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn current(&self) -> usize {
        self.inner.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }
}

pub struct ProbeGuard {
    inner: Arc<Counters>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.inner.current.fetch_sub(1, Ordering::SeqCst);
    }
}
