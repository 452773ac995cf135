// src/dag/traverse.rs

//! Sequential depth-first and breadth-first traversals.
//!
//! Both run on the calling thread over a snapshot taken when the traversal
//! starts, so the visitor may mutate the graph. Each starts from the roots in
//! id order and visits each vertex once. They give no ordering
//! guarantee across edges beyond what the search order implies; use
//! [`walk`](crate::dag::walk) when a vertex must wait for all its parents.

use std::collections::{HashSet, VecDeque};

use crate::dag::graph::Dag;
use crate::dag::vertex::{Vertex, VertexId};

impl<T> Dag<T> {
    /// Depth-first traversal: follow each branch to the end before
    /// backtracking. Siblings are explored in id order.
    pub fn dfs_walk(&self, mut visit: impl FnMut(&Vertex<T>)) {
        let topo = self.snapshot();
        let mut stack: Vec<VertexId> = topo.roots().into_iter().rev().collect();
        let mut visited: HashSet<VertexId> = HashSet::with_capacity(topo.vertices.len());

        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(vertex) = topo.vertex(id.as_str()) {
                visit(&vertex);
            }
            let children: Vec<VertexId> = topo.children_of(id.as_str()).cloned().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Breadth-first traversal: every vertex at one depth before the next.
    pub fn bfs_walk(&self, mut visit: impl FnMut(&Vertex<T>)) {
        let topo = self.snapshot();
        let mut queue: VecDeque<VertexId> = topo.roots().into_iter().collect();
        let mut visited: HashSet<VertexId> = HashSet::with_capacity(topo.vertices.len());

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(vertex) = topo.vertex(id.as_str()) {
                visit(&vertex);
            }
            queue.extend(topo.children_of(id.as_str()).cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      a       e
    //     / \
    //    b   c
    //    |
    //    d
    fn tree() -> Dag<()> {
        let dag = Dag::new();
        for id in ["a", "b", "c", "d", "e"] {
            dag.add_vertex(id, ()).unwrap();
        }
        dag.add_edge("a", "b").unwrap();
        dag.add_edge("a", "c").unwrap();
        dag.add_edge("b", "d").unwrap();
        dag
    }

    fn order(walk: impl FnOnce(&mut dyn FnMut(&Vertex<()>))) -> Vec<String> {
        let mut seen = Vec::new();
        walk(&mut |v: &Vertex<()>| seen.push(v.id.to_string()));
        seen
    }

    #[test]
    fn dfs_follows_branches_first() {
        let dag = tree();
        let seen = order(|f| dag.dfs_walk(f));
        assert_eq!(seen, ["a", "b", "d", "c", "e"]);
    }

    #[test]
    fn bfs_goes_level_by_level() {
        let dag = tree();
        let seen = order(|f| dag.bfs_walk(f));
        assert_eq!(seen, ["a", "e", "b", "c", "d"]);
    }

    #[test]
    fn shared_child_is_visited_once() {
        let dag = tree();
        dag.add_edge("c", "d").unwrap();

        let seen = order(|f| dag.dfs_walk(f));
        assert_eq!(seen.iter().filter(|id| *id == "d").count(), 1);
    }

    #[test]
    fn visitor_may_grow_the_graph_it_walks() {
        let dag = tree();
        let mut seen = Vec::new();
        dag.bfs_walk(|v| {
            seen.push(v.id.to_string());
            let leaf = format!("{}-leaf", v.id);
            dag.add_vertex(leaf.as_str(), ()).unwrap();
            dag.add_edge(v.id.as_str(), &leaf).unwrap();
        });

        assert_eq!(seen, ["a", "e", "b", "c", "d"]);
        assert_eq!(dag.len(), 10);
        assert!(dag.children("d").unwrap().contains(&VertexId::from("d-leaf")));
    }
}
