// src/engine/bounded_walk.rs

//! Dependency-ordered walk whose visits run on a [`WorkerPool`].
//!
//! Vertices that become eligible are pushed onto an unbounded channel; a
//! single dispatcher loop moves them into the pool. Visit tasks therefore
//! never block on pool backpressure while handing over their children.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dag::visitation::{Launch, Visitation};
use crate::dag::{Dag, Vertex, WalkSummary};
use crate::pool::{PoolConfig, WorkerPool};

/// Like [`walk`](crate::dag::walk), but at most `max_workers` visits run at
/// the same time. `max_workers == 0` is treated as one.
///
/// Launches still queued when `cancel` fires are skipped: their visitor
/// never runs and they are not counted as visited.
pub async fn walk_bounded<T, F, Fut>(
    cancel: CancellationToken,
    dag: &Dag<T>,
    max_workers: usize,
    visit: F,
) -> WalkSummary
where
    T: Send + Sync + 'static,
    F: Fn(Vertex<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let visitation = Arc::new(Visitation::new(dag.snapshot(), cancel));
    let visit = Arc::new(visit);
    let (ready_tx, mut ready_rx) = mpsc::unbounded_channel::<Launch<T>>();

    for launch in visitation.seed() {
        // The receiver lives until the end of this function.
        let _ = ready_tx.send(launch);
    }

    // The pool is never cancelled itself: a cancelled walk skips its queued
    // launches inside the job so their in-flight count is released cleanly.
    let (mut pool, results) =
        WorkerPool::<()>::new(PoolConfig::new(max_workers, false), CancellationToken::new());
    let drained = tokio::spawn(results.drain());

    loop {
        tokio::select! {
            Some(launch) = ready_rx.recv() => {
                let visit = Arc::clone(&visit);
                let ready_tx = ready_tx.clone();
                let submitted = pool
                    .submit(move || async move {
                        visit_one(visit, launch, ready_tx).await;
                        Ok(())
                    })
                    .await;
                if let Err(err) = submitted {
                    warn!(error = %err, "could not dispatch vertex");
                }
            }
            _ = visitation.wait_idle() => break,
        }
    }

    drop(ready_tx);
    pool.close().await;

    match drained.await {
        Ok(report) if report.failed > 0 => {
            warn!(
                failed = report.failed,
                "visitor panicked; dependents of those vertices were not visited"
            );
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "result collector ended abnormally"),
    }

    let summary = visitation.summary();
    info!(
        visited = summary.visited,
        total = summary.total,
        cancelled = summary.cancelled,
        max_workers,
        "bounded walk finished"
    );
    summary
}

async fn visit_one<T, F, Fut>(
    visit: Arc<F>,
    launch: Launch<T>,
    ready: mpsc::UnboundedSender<Launch<T>>,
) where
    F: Fn(Vertex<T>, CancellationToken) -> Fut,
    Fut: Future<Output = ()>,
{
    let token = launch.cancel_token();
    if token.is_cancelled() {
        launch.skip();
        return;
    }

    let vertex = launch.vertex().clone();
    debug!(vertex = %vertex.id, "visiting");
    (*visit)(vertex, token).await;

    for child in launch.complete() {
        if ready.send(child).is_err() {
            debug!("dispatcher gone; dropping eligible vertex");
        }
    }
}
