// src/dag/vertex.rs

//! Vertex identity and the vertex view handed to visitors.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a vertex, unique within one [`Dag`](crate::dag::Dag).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(String);

impl VertexId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VertexId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for VertexId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VertexId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A vertex as seen by visitors: its id plus a shared handle to its value.
///
/// The value is owned by the graph store; visitors only get read access.
#[derive(Debug)]
pub struct Vertex<T> {
    pub id: VertexId,
    pub value: Arc<T>,
}

impl<T> Vertex<T> {
    pub fn new(id: VertexId, value: Arc<T>) -> Self {
        Self { id, value }
    }
}

// Manual impl: cloning a vertex never requires `T: Clone`.
impl<T> Clone for Vertex<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            value: Arc::clone(&self.value),
        }
    }
}
