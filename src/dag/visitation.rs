// src/dag/visitation.rs

//! Per-walk bookkeeping for the ordered walk.
//!
//! A [`Visitation`] is created fresh for every walk and owns:
//! - the topology snapshot the walk runs over
//! - one [`VisitState`] per vertex
//! - the in-flight counter that tells the walk when it is done
//!
//! State transitions and launch decisions happen under one mutex so that two
//! parents finishing at the same moment cannot both launch their shared child.
//! The mutex is never held while a visitor runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::dag::graph::Topology;
use crate::dag::vertex::{Vertex, VertexId};

/// Visitation state of a vertex within one walk.
///
/// Transitions are strictly `Unvisited -> Visiting -> Visited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// Not launched yet.
    Unvisited,
    /// Launched; its visitor has not finished.
    Visiting,
    /// Its visitor returned.
    Visited,
}

/// Outcome of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    /// Number of vertices in the walked snapshot.
    pub total: usize,
    /// Number of vertices whose visitor returned.
    pub visited: usize,
    /// Whether the walk's token was cancelled before it finished.
    pub cancelled: bool,
}

impl WalkSummary {
    /// Every vertex was visited.
    pub fn is_complete(&self) -> bool {
        self.visited == self.total
    }
}

#[derive(Debug)]
pub(crate) struct Visitation<T> {
    topology: Topology<T>,
    states: Mutex<HashMap<VertexId, VisitState>>,
    in_flight: AtomicUsize,
    idle: Notify,
    cancel: CancellationToken,
}

impl<T> Visitation<T> {
    pub(crate) fn new(topology: Topology<T>, cancel: CancellationToken) -> Self {
        let states = topology
            .vertices
            .keys()
            .map(|id| (id.clone(), VisitState::Unvisited))
            .collect();

        Self {
            topology,
            states: Mutex::new(states),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
            cancel,
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn states(&self) -> MutexGuard<'_, HashMap<VertexId, VisitState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// State of `id` in this walk, if the vertex is part of it.
    #[cfg(test)]
    pub(crate) fn state_of(&self, id: &str) -> Option<VisitState> {
        self.states().get(id).copied()
    }

    /// Mark every root `Visiting` and return launch guards for them.
    pub(crate) fn seed(self: &Arc<Self>) -> Vec<Launch<T>> {
        let mut states = self.states();
        if self.cancel.is_cancelled() {
            debug!("walk cancelled before it started; launching nothing");
            return Vec::new();
        }

        let roots = self.topology.roots();
        debug!(roots = roots.len(), total = states.len(), "seeding walk from roots");

        roots
            .iter()
            .filter_map(|id| self.begin(&mut states, id.as_str()))
            .collect()
    }

    /// Transition `id` to `Visiting` and count it as in flight.
    ///
    /// Must be called with the state lock held.
    fn begin(
        self: &Arc<Self>,
        states: &mut HashMap<VertexId, VisitState>,
        id: &str,
    ) -> Option<Launch<T>> {
        let vertex = self.topology.vertex(id)?;
        let state = states.get_mut(id)?;
        if *state != VisitState::Unvisited {
            return None;
        }

        *state = VisitState::Visiting;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        trace!(vertex = %vertex.id, "vertex launched");

        Some(Launch {
            visitation: Arc::clone(self),
            vertex,
            finished: false,
        })
    }

    /// Mark `id` visited and launch every child whose parents are now all
    /// visited. Nothing new is launched once the walk is cancelled.
    fn complete(self: &Arc<Self>, id: &str) -> Vec<Launch<T>> {
        let mut states = self.states();

        match states.get_mut(id) {
            Some(state) => *state = VisitState::Visited,
            None => {
                warn!(vertex = %id, "completed vertex is not part of this walk");
                return Vec::new();
            }
        }

        if self.cancel.is_cancelled() {
            debug!(vertex = %id, "walk cancelled; not launching dependents");
            return Vec::new();
        }

        let mut ready = Vec::new();
        for child in self.topology.children_of(id) {
            if states.get(child) != Some(&VisitState::Unvisited) {
                continue;
            }

            let all_parents_visited = self
                .topology
                .parents_of(child.as_str())
                .all(|parent| states.get(parent) == Some(&VisitState::Visited));

            if all_parents_visited {
                ready.extend(self.begin(&mut states, child.as_str()));
            }
        }

        ready
    }

    fn finish_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Resolve once no launched vertex is still in flight.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn summary(&self) -> WalkSummary {
        let states = self.states();
        WalkSummary {
            total: states.len(),
            visited: states
                .values()
                .filter(|s| **s == VisitState::Visited)
                .count(),
            cancelled: self.cancel.is_cancelled(),
        }
    }
}

/// A launched vertex that is counted as in flight.
///
/// Dropping it releases the in-flight count, whether or not
/// [`Launch::complete`] was called first. A vertex dropped without completing
/// (its visitor panicked, or a pool discarded the job) stays `Visiting` and its
/// dependents are never launched, but the walk still terminates.
#[derive(Debug)]
pub(crate) struct Launch<T> {
    visitation: Arc<Visitation<T>>,
    vertex: Vertex<T>,
    finished: bool,
}

impl<T> Launch<T> {
    pub(crate) fn vertex(&self) -> &Vertex<T> {
        &self.vertex
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.visitation.cancel_token().clone()
    }

    /// Record that the visitor returned; yields the newly eligible children.
    pub(crate) fn complete(mut self) -> Vec<Launch<T>> {
        self.finished = true;
        self.visitation.complete(self.vertex.id.as_str())
    }

    /// Release the launch without visiting it, e.g. because the walk was
    /// cancelled while the launch sat in a queue. The vertex stays `Visiting`
    /// and is not counted as visited.
    pub(crate) fn skip(mut self) {
        self.finished = true;
        debug!(vertex = %self.vertex.id, "walk cancelled; vertex skipped");
    }
}

impl<T> Drop for Launch<T> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                vertex = %self.vertex.id,
                "vertex dropped before its visit finished; dependents will not run"
            );
        }
        self.visitation.finish_one();
    }
}
