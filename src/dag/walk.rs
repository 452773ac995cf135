// src/dag/walk.rs

//! Concurrent, dependency-ordered walk over a [`Dag`].
//!
//! For every edge `u -> v`, the visit of `u` returns before the visit of `v`
//! starts. Vertices not connected by a path may be visited concurrently, on
//! any of the runtime's worker threads.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dag::graph::Dag;
use crate::dag::vertex::Vertex;
use crate::dag::visitation::{Launch, Visitation, WalkSummary};

/// Visit every vertex of `dag` exactly once, in dependency order.
///
/// Each eligible vertex gets its own Tokio task; there is no cap on how many
/// run at once (see [`walk_bounded`](crate::engine::walk_bounded) for that).
/// The returned future resolves once every launched visit has finished.
///
/// The walk runs over a snapshot of the graph taken when it starts, so
/// several walks may run over the same graph at once without interfering.
///
/// Errors are the visitor's own business: `visit` returns `()`, and a
/// failing vertex still counts as visited. After `cancel` fires no further
/// vertex is launched; visits already running are left to finish and receive
/// the token so they can stop early.
pub async fn walk<T, F, Fut>(cancel: CancellationToken, dag: &Dag<T>, visit: F) -> WalkSummary
where
    T: Send + Sync + 'static,
    F: Fn(Vertex<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let visitation = Arc::new(Visitation::new(dag.snapshot(), cancel));
    let visit = Arc::new(visit);

    for launch in visitation.seed() {
        spawn_visit(Arc::clone(&visit), launch);
    }

    visitation.wait_idle().await;

    let summary = visitation.summary();
    info!(
        visited = summary.visited,
        total = summary.total,
        cancelled = summary.cancelled,
        "walk finished"
    );
    summary
}

fn spawn_visit<T, F, Fut>(visit: Arc<F>, launch: Launch<T>)
where
    T: Send + Sync + 'static,
    F: Fn(Vertex<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let vertex = launch.vertex().clone();
        debug!(vertex = %vertex.id, "visiting");

        (*visit)(vertex, launch.cancel_token()).await;

        for child in launch.complete() {
            spawn_visit(Arc::clone(&visit), child);
        }
    });
}
