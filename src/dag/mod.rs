// src/dag/mod.rs

//! DAG storage and dependency-ordered traversal.
//!
//! - [`graph`] holds the thread-safe graph store.
//! - [`vertex`] defines vertex ids and the vertex view handed to visitors.
//! - [`error`] lists the ways a mutation can be rejected.
//! - [`storable`] converts a graph to and from a serializable form.
//! - [`traverse`] provides sequential DFS / BFS traversals.
//! - [`visitation`] holds the per-walk state machine.
//! - [`walk`] drives the concurrent, ordered walk.

pub mod error;
pub mod graph;
pub mod storable;
pub mod traverse;
pub mod vertex;
pub mod visitation;
pub mod walk;

pub use error::{GraphError, GraphResult};
pub use graph::Dag;
pub use storable::{StorableDag, StorableEdge, StorableVertex};
pub use vertex::{Vertex, VertexId};
pub use visitation::{VisitState, WalkSummary};
pub use walk::walk;
