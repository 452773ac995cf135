// src/dag/error.rs

//! Errors returned by [`Dag`](crate::dag::Dag) mutations and lookups.

use thiserror::Error;

use crate::dag::VertexId;

/// Result type for graph store operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Ways a graph store operation can be rejected.
///
/// A rejected operation never leaves a partial change behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// `add_vertex` was given an explicit id that is already present.
    #[error("duplicate vertex id '{0}'")]
    DuplicateVertex(VertexId),

    /// An edge or lookup referenced a vertex the graph does not hold.
    #[error("vertex '{0}' not found")]
    VertexNotFound(VertexId),

    /// An edge from a vertex to itself.
    #[error("vertex '{0}' cannot depend on itself")]
    SelfLoop(VertexId),

    /// The edge would close a cycle: `to` already reaches `from`.
    #[error("edge '{from}' -> '{to}' would create a cycle")]
    CycleDetected { from: VertexId, to: VertexId },
}
