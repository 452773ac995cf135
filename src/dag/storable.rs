// src/dag/storable.rs

//! Serializable snapshot of a graph's shape.
//!
//! Field names are kept short (`vs`/`es`, `i`/`v`, `s`/`d`) to keep stored
//! documents compact. Loading goes back through [`Dag::add_vertex`] and
//! [`Dag::add_edge`], so a stored document can never smuggle in a cycle.

use serde::{Deserialize, Serialize};

use crate::dag::error::GraphResult;
use crate::dag::graph::Dag;
use crate::dag::vertex::VertexId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorableVertex<T> {
    #[serde(rename = "i")]
    pub id: VertexId,
    #[serde(rename = "v")]
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorableEdge {
    #[serde(rename = "s")]
    pub from: VertexId,
    #[serde(rename = "d")]
    pub to: VertexId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorableDag<T> {
    #[serde(rename = "vs", default)]
    pub vertices: Vec<StorableVertex<T>>,
    #[serde(rename = "es", default)]
    pub edges: Vec<StorableEdge>,
}

impl<T: Clone> Dag<T> {
    /// Export vertices and edges, sorted by id so the output is stable.
    pub fn to_storable(&self) -> StorableDag<T> {
        self.with_topology(|topo| {
            let mut vertices: Vec<StorableVertex<T>> = topo
                .vertices
                .iter()
                .map(|(id, value)| StorableVertex {
                    id: id.clone(),
                    value: T::clone(value),
                })
                .collect();
            vertices.sort_by(|a, b| a.id.cmp(&b.id));

            let mut edges: Vec<StorableEdge> = topo
                .children
                .iter()
                .flat_map(|(from, children)| {
                    children.iter().map(move |to| StorableEdge {
                        from: from.clone(),
                        to: to.clone(),
                    })
                })
                .collect();
            edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

            StorableDag { vertices, edges }
        })
    }
}

impl<T> Dag<T> {
    /// Rebuild a graph, applying the same checks as live mutations.
    pub fn from_storable(stored: StorableDag<T>) -> GraphResult<Self> {
        let dag = Dag::new();
        for vertex in stored.vertices {
            dag.add_vertex(vertex.id.as_str(), vertex.value)?;
        }
        for edge in &stored.edges {
            dag.add_edge(edge.from.as_str(), edge.to.as_str())?;
        }
        Ok(dag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::GraphError;

    #[test]
    fn json_uses_compact_field_names() {
        let dag = Dag::new();
        dag.add_vertex("api", "repos/api".to_string()).unwrap();
        dag.add_vertex("web", "repos/web".to_string()).unwrap();
        dag.add_edge("api", "web").unwrap();

        let json = serde_json::to_string(&dag.to_storable()).unwrap();
        assert_eq!(
            json,
            r#"{"vs":[{"i":"api","v":"repos/api"},{"i":"web","v":"repos/web"}],"es":[{"s":"api","d":"web"}]}"#
        );
    }

    #[test]
    fn loading_a_cyclic_document_fails() {
        let json = r#"{"vs":[{"i":"a","v":1},{"i":"b","v":2}],"es":[{"s":"a","d":"b"},{"s":"b","d":"a"}]}"#;
        let stored: StorableDag<u32> = serde_json::from_str(json).unwrap();

        let err = Dag::from_storable(stored).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn loading_restores_shape() {
        let json = r#"{"vs":[{"i":"a","v":1},{"i":"b","v":2},{"i":"c","v":3}],"es":[{"s":"a","d":"c"}]}"#;
        let stored: StorableDag<u32> = serde_json::from_str(json).unwrap();

        let dag = Dag::from_storable(stored).unwrap();
        assert_eq!(dag.len(), 3);
        assert_eq!(dag.edge_count(), 1);
        assert_eq!(dag.vertex("b").as_deref(), Some(&2));
    }
}
