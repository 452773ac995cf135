// tests/bounded_walk.rs

mod common;
use crate::common::builders::dag_of;
use crate::common::{init_tracing, with_timeout, ConcurrencyProbe, TestResult};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskdag::engine::walk_bounded;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wide_graph_respects_worker_limit() -> TestResult {
    init_tracing();
    let ids: Vec<String> = (0..12).map(|i| format!("leaf{i}")).collect();
    let mut vertices: Vec<&str> = vec!["root"];
    vertices.extend(ids.iter().map(String::as_str));
    let edges: Vec<(&str, &str)> = ids.iter().map(|id| ("root", id.as_str())).collect();
    let dag = dag_of(&vertices, &edges);

    let probe = ConcurrencyProbe::new();
    let visiting = probe.clone();
    let summary = with_timeout(walk_bounded(CancellationToken::new(), &dag, 3, move |_, _| {
        let probe = visiting.clone();
        async move {
            let _running = probe.enter();
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
    }))
    .await;

    assert!(summary.is_complete());
    assert_eq!(summary.visited, 13);
    assert!(probe.peak() <= 3, "peak concurrency was {}", probe.peak());
    assert_eq!(probe.peak(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ordering_holds_under_a_single_worker() -> TestResult {
    init_tracing();
    let dag = dag_of(
        &["a", "b", "c", "d"],
        &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
    );

    let order = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&order);
    let summary = with_timeout(walk_bounded(CancellationToken::new(), &dag, 1, move |v, _| {
        let seen = Arc::clone(&seen);
        async move {
            seen.lock().unwrap().push(v.id.to_string());
        }
    }))
    .await;

    assert!(summary.is_complete());
    let order = order.lock().unwrap().clone();
    assert_eq!(order.first().map(String::as_str), Some("a"));
    assert_eq!(order.last().map(String::as_str), Some("d"));
    assert_eq!(order.len(), 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_leaves_queued_vertices_unvisited() -> TestResult {
    init_tracing();
    let ids: Vec<String> = (0..8).map(|i| format!("n{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let dag = dag_of(&refs, &[]);

    let token = CancellationToken::new();
    let canceller = token.clone();
    let summary = with_timeout(walk_bounded(token, &dag, 1, move |_, _| {
        let canceller = canceller.clone();
        async move {
            canceller.cancel();
        }
    }))
    .await;

    assert!(summary.cancelled);
    assert_eq!(summary.visited, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_visitor_does_not_hang_bounded_walk() -> TestResult {
    init_tracing();
    let dag = dag_of(&["boom", "after", "other"], &[("boom", "after")]);

    let summary = with_timeout(walk_bounded(CancellationToken::new(), &dag, 2, |v, _| async move {
        if v.id.as_str() == "boom" {
            panic!("visitor failure");
        }
    }))
    .await;

    assert_eq!(summary.visited, 1);
    assert!(!summary.is_complete());
    Ok(())
}
