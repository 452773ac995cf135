// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::dag::error::{GraphError, GraphResult};
use crate::dag::vertex::{Vertex, VertexId};

/// Adjacency information plus vertex values.
///
/// Every vertex has an entry in `children` and `parents`, even when the set
/// is empty. Only ever mutated after all checks for an operation passed.
#[derive(Debug)]
pub(crate) struct Topology<T> {
    pub(crate) vertices: HashMap<VertexId, Arc<T>>,
    pub(crate) children: HashMap<VertexId, BTreeSet<VertexId>>,
    pub(crate) parents: HashMap<VertexId, BTreeSet<VertexId>>,
}

impl<T> Clone for Topology<T> {
    fn clone(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            children: self.children.clone(),
            parents: self.parents.clone(),
        }
    }
}

impl<T> Default for Topology<T> {
    fn default() -> Self {
        Self {
            vertices: HashMap::new(),
            children: HashMap::new(),
            parents: HashMap::new(),
        }
    }
}

impl<T> Topology<T> {
    pub(crate) fn vertex(&self, id: &str) -> Option<Vertex<T>> {
        self.vertices
            .get_key_value(id)
            .map(|(id, value)| Vertex::new(id.clone(), Arc::clone(value)))
    }

    pub(crate) fn children_of(&self, id: &str) -> impl Iterator<Item = &VertexId> {
        self.children.get(id).into_iter().flatten()
    }

    pub(crate) fn parents_of(&self, id: &str) -> impl Iterator<Item = &VertexId> {
        self.parents.get(id).into_iter().flatten()
    }

    /// Vertices with no incoming edges, sorted by id.
    pub(crate) fn roots(&self) -> BTreeSet<VertexId> {
        self.parents
            .iter()
            .filter(|(_, parents)| parents.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn leaves(&self) -> BTreeSet<VertexId> {
        self.children
            .iter()
            .filter(|(_, children)| children.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn edge_count(&self) -> usize {
        self.children.values().map(BTreeSet::len).sum()
    }

    /// Whether `target` can be reached from `start` by following edges forward.
    fn reaches(&self, start: &str, target: &str) -> bool {
        let mut queue: VecDeque<&str> = VecDeque::from([start]);
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(id) = queue.pop_front() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            queue.extend(self.children_of(id).map(VertexId::as_str));
        }

        false
    }

    /// Transitive closure over `edges`, excluding `start` itself.
    fn closure(
        &self,
        start: &str,
        edges: &HashMap<VertexId, BTreeSet<VertexId>>,
    ) -> BTreeSet<VertexId> {
        let mut found = BTreeSet::new();
        let mut stack: Vec<&VertexId> = edges.get(start).into_iter().flatten().collect();

        while let Some(id) = stack.pop() {
            if found.insert(id.clone()) {
                stack.extend(edges.get(id.as_str()).into_iter().flatten());
            }
        }

        found
    }
}

/// Thread-safe directed acyclic graph of opaque values.
///
/// Mutations take the write lock for their whole check-and-commit sequence,
/// so concurrent `add_vertex` / `add_edge` calls serialize. Queries take the
/// read lock and may run in parallel with each other.
///
/// Acyclicity is enforced when an edge is inserted: an edge `a -> b` is
/// rejected if `b` already reaches `a`.
#[derive(Debug)]
pub struct Dag<T> {
    topology: RwLock<Topology<T>>,
    next_auto_id: AtomicU64,
}

impl<T> Default for Dag<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Dag<T> {
    pub fn new() -> Self {
        Self {
            topology: RwLock::new(Topology::default()),
            next_auto_id: AtomicU64::new(1),
        }
    }

    // A panic can only happen before the commit step of a mutation, so a
    // poisoned topology is still well-formed.
    fn read(&self) -> RwLockReadGuard<'_, Topology<T>> {
        self.topology.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Topology<T>> {
        self.topology.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a vertex and return its id.
    ///
    /// An empty `id` asks the graph to assign one (`v1`, `v2`, ...); ids a
    /// caller already claimed are skipped.
    pub fn add_vertex(&self, id: impl Into<String>, value: T) -> GraphResult<VertexId> {
        let requested = id.into();
        let mut topo = self.write();

        let id = if requested.is_empty() {
            loop {
                let n = self.next_auto_id.fetch_add(1, Ordering::Relaxed);
                let candidate = VertexId::from(format!("v{n}"));
                if !topo.vertices.contains_key(&candidate) {
                    break candidate;
                }
            }
        } else {
            let id = VertexId::from(requested);
            if topo.vertices.contains_key(&id) {
                return Err(GraphError::DuplicateVertex(id));
            }
            id
        };

        topo.vertices.insert(id.clone(), Arc::new(value));
        topo.children.insert(id.clone(), BTreeSet::new());
        topo.parents.insert(id.clone(), BTreeSet::new());

        trace!(vertex = %id, "vertex added");
        Ok(id)
    }

    /// Add the edge `from -> to`: `to` will only be visited after `from`.
    ///
    /// Adding an edge that already exists is a no-op.
    pub fn add_edge(&self, from: &str, to: &str) -> GraphResult<()> {
        let mut topo = self.write();

        for id in [from, to] {
            if !topo.vertices.contains_key(id) {
                return Err(GraphError::VertexNotFound(id.into()));
            }
        }

        if from == to {
            return Err(GraphError::SelfLoop(from.into()));
        }

        if topo.children_of(from).any(|child| child.as_str() == to) {
            return Ok(());
        }

        if topo.reaches(to, from) {
            debug!(from, to, "rejecting edge that would close a cycle");
            return Err(GraphError::CycleDetected {
                from: from.into(),
                to: to.into(),
            });
        }

        topo.children
            .entry(from.into())
            .or_default()
            .insert(to.into());
        topo.parents
            .entry(to.into())
            .or_default()
            .insert(from.into());

        trace!(from, to, "edge added");
        Ok(())
    }

    pub fn vertex(&self, id: &str) -> Option<Arc<T>> {
        self.read().vertices.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().vertices.contains_key(id)
    }

    /// Direct successors of `id`.
    pub fn children(&self, id: &str) -> GraphResult<BTreeSet<VertexId>> {
        self.read()
            .children
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::VertexNotFound(id.into()))
    }

    /// Direct predecessors of `id`.
    pub fn parents(&self, id: &str) -> GraphResult<BTreeSet<VertexId>> {
        self.read()
            .parents
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::VertexNotFound(id.into()))
    }

    /// Every vertex reachable from `id`.
    pub fn descendants(&self, id: &str) -> GraphResult<BTreeSet<VertexId>> {
        let topo = self.read();
        if !topo.vertices.contains_key(id) {
            return Err(GraphError::VertexNotFound(id.into()));
        }
        Ok(topo.closure(id, &topo.children))
    }

    /// Every vertex that reaches `id`.
    pub fn ancestors(&self, id: &str) -> GraphResult<BTreeSet<VertexId>> {
        let topo = self.read();
        if !topo.vertices.contains_key(id) {
            return Err(GraphError::VertexNotFound(id.into()));
        }
        Ok(topo.closure(id, &topo.parents))
    }

    /// Vertices with in-degree zero.
    pub fn roots(&self) -> BTreeSet<VertexId> {
        self.read().roots()
    }

    /// Vertices with out-degree zero.
    pub fn leaves(&self) -> BTreeSet<VertexId> {
        self.read().leaves()
    }

    /// All vertex ids, sorted.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.read().vertices.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.read().edge_count()
    }

    /// Copy of the current topology, taken under a single read lock.
    pub(crate) fn snapshot(&self) -> Topology<T> {
        self.read().clone()
    }

    /// Run `f` against the topology while holding the read lock.
    pub(crate) fn with_topology<R>(&self, f: impl FnOnce(&Topology<T>) -> R) -> R {
        f(&self.read())
    }
}

impl<T> fmt::Display for Dag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topo = self.read();
        writeln!(
            f,
            "DAG vertices: {} edges: {}",
            topo.vertices.len(),
            topo.edge_count()
        )?;

        let mut ids: Vec<&VertexId> = topo.vertices.keys().collect();
        ids.sort();
        for from in ids {
            for to in topo.children_of(from.as_str()) {
                writeln!(f, "  {from} -> {to}")?;
            }
        }
        Ok(())
    }
}
