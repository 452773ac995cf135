// tests/graph_store.rs

mod common;
use crate::common::builders::dag_of;
use crate::common::{init_tracing, TestResult};

use std::sync::Arc;
use std::thread;

use taskdag::dag::{Dag, GraphError, StorableDag, VertexId};

#[test]
fn concurrent_adds_from_many_threads_all_land() -> TestResult {
    init_tracing();
    let dag = Arc::new(Dag::<usize>::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let dag = Arc::clone(&dag);
            thread::spawn(move || {
                for i in 0..50 {
                    dag.add_vertex(format!("t{t}-{i}"), i).unwrap();
                    if i > 0 {
                        dag.add_edge(&format!("t{t}-{}", i - 1), &format!("t{t}-{i}"))
                            .unwrap();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("writer thread panicked");
    }

    assert_eq!(dag.len(), 400);
    assert_eq!(dag.edge_count(), 8 * 49);
    assert_eq!(dag.roots().len(), 8);
    Ok(())
}

#[test]
fn concurrent_auto_ids_are_unique() {
    let dag = Arc::new(Dag::<()>::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dag = Arc::clone(&dag);
            thread::spawn(move || {
                (0..25)
                    .map(|_| dag.add_vertex("", ()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<VertexId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
}

#[test]
fn self_loop_is_rejected() {
    let dag = dag_of(&["a"], &[]);
    assert_eq!(dag.add_edge("a", "a"), Err(GraphError::SelfLoop("a".into())));
    assert_eq!(dag.edge_count(), 0);
}

#[test]
fn cycle_is_rejected_and_graph_is_unchanged() {
    let dag = dag_of(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let before = dag.to_string();

    let err = dag.add_edge("c", "a").unwrap_err();
    assert_eq!(
        err,
        GraphError::CycleDetected {
            from: "c".into(),
            to: "a".into()
        }
    );
    assert_eq!(dag.to_string(), before);
    assert!(dag.children("c").unwrap().is_empty());
}

#[test]
fn duplicate_vertex_keeps_original_value() {
    let dag = Dag::new();
    dag.add_vertex("x", 1).unwrap();

    assert_eq!(
        dag.add_vertex("x", 2),
        Err(GraphError::DuplicateVertex("x".into()))
    );
    assert_eq!(dag.vertex("x").as_deref(), Some(&1));
    assert_eq!(dag.len(), 1);
}

#[test]
fn edge_to_missing_vertex_is_rejected() {
    let dag = dag_of(&["a"], &[]);
    assert_eq!(
        dag.add_edge("a", "ghost"),
        Err(GraphError::VertexNotFound("ghost".into()))
    );
    assert!(matches!(
        dag.parents("ghost"),
        Err(GraphError::VertexNotFound(_))
    ));
}

#[test]
fn storable_form_survives_json() -> TestResult {
    let dag = Dag::new();
    dag.add_vertex("fetch", "git fetch".to_string())?;
    dag.add_vertex("build", "make".to_string())?;
    dag.add_edge("fetch", "build")?;

    let json = serde_json::to_string(&dag.to_storable())?;
    let stored: StorableDag<String> = serde_json::from_str(&json)?;
    let restored = Dag::from_storable(stored)?;

    assert_eq!(restored.to_string(), dag.to_string());
    assert_eq!(restored.vertex("build").as_deref(), Some(&"make".to_string()));
    Ok(())
}
