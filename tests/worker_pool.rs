// tests/worker_pool.rs

mod common;
use crate::common::{init_tracing, with_timeout, ConcurrencyProbe, TestResult};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use taskdag::pool::{JobError, PoolConfig, WorkerPool};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_more_than_max_workers_jobs_at_once() -> TestResult {
    init_tracing();
    let probe = ConcurrencyProbe::new();
    let (mut pool, results) =
        WorkerPool::<usize>::new(PoolConfig::new(2, false), CancellationToken::new());
    let drained = tokio::spawn(results.drain());

    for i in 0..10 {
        let probe = probe.clone();
        pool.submit(move || async move {
            let _running = probe.enter();
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(i)
        })
        .await?;
    }

    with_timeout(pool.close()).await;
    let report = drained.await?;

    assert_eq!(report.succeeded, 10);
    assert!(probe.peak() <= 2, "peak concurrency was {}", probe.peak());
    assert_eq!(probe.peak(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fail_fast_skips_queued_jobs_and_reports_every_job() -> TestResult {
    init_tracing();
    let (mut pool, mut results) =
        WorkerPool::<u32>::new(PoolConfig::new(2, true), CancellationToken::new());
    let collected = tokio::spawn(async move {
        let mut all = Vec::new();
        while let Some(result) = results.recv().await {
            all.push(result);
        }
        all
    });

    let executed = Arc::new(AtomicUsize::new(0));
    let mut failing = None;
    for i in 0..10u32 {
        let executed = Arc::clone(&executed);
        let id = pool
            .submit(move || async move {
                executed.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                if i == 5 {
                    return Err(anyhow!("job five broke"));
                }
                Ok(i)
            })
            .await?;
        if i == 5 {
            failing = Some(id);
        }
    }

    with_timeout(pool.close()).await;
    let results = collected.await?;
    let failing = failing.expect("job five was submitted");

    let executed = executed.load(Ordering::SeqCst);
    let skipped: Vec<_> = results
        .iter()
        .filter(|r| matches!(r.err(), Some(JobError::NotRun)))
        .map(|r| r.id)
        .collect();
    let failed: Vec<_> = results
        .iter()
        .filter(|r| matches!(r.err(), Some(JobError::Failed(_))))
        .map(|r| r.id)
        .collect();

    assert_eq!(results.len(), 10);
    assert_eq!(failed, vec![failing]);
    assert!(!skipped.is_empty(), "jobs after the failure should be skipped");
    assert_eq!(executed + skipped.len(), 10);
    assert!(executed < 10);
    assert!(skipped.iter().all(|id| *id > failing));
    assert!(pool.has_failed());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn without_fail_fast_every_job_runs() -> TestResult {
    init_tracing();
    let (mut pool, results) =
        WorkerPool::<u32>::new(PoolConfig::new(3, false), CancellationToken::new());
    let drained = tokio::spawn(results.drain());

    for i in 0..6u32 {
        pool.submit(move || async move {
            if i % 2 == 0 {
                Err(anyhow!("even job {i} failed"))
            } else {
                Ok(i)
            }
        })
        .await?;
    }

    with_timeout(pool.close()).await;
    let report = drained.await?;

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 3);
    assert_eq!(report.skipped, 0);
    assert!(!pool.has_failed());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_pool_reports_queued_jobs_as_cancelled() -> TestResult {
    init_tracing();
    let cancel = CancellationToken::new();
    let (mut pool, mut results) = WorkerPool::<()>::new(PoolConfig::new(1, false), cancel.clone());

    let gate = cancel.clone();
    pool.submit(move || async move {
        gate.cancel();
        Ok(())
    })
    .await?;
    pool.submit(|| async { Ok(()) }).await?;

    let first = with_timeout(results.recv()).await.expect("first result");
    let second = with_timeout(results.recv()).await.expect("second result");
    with_timeout(pool.close()).await;

    assert!(first.is_ok());
    assert!(matches!(second.err(), Some(JobError::Cancelled)));
    assert!(results.recv().await.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn results_stream_in_completion_order() -> TestResult {
    init_tracing();
    let (mut pool, mut results) =
        WorkerPool::<&'static str>::new(PoolConfig::new(2, false), CancellationToken::new());

    let slow = pool
        .submit(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok("slow")
        })
        .await?;
    let fast = pool.submit(|| async { Ok("fast") }).await?;

    let first = with_timeout(results.recv()).await.expect("first result");
    let second = with_timeout(results.recv()).await.expect("second result");
    with_timeout(pool.close()).await;

    assert_eq!(first.id, fast);
    assert_eq!(second.id, slow);
    assert_eq!(second.outcome?, "slow");
    Ok(())
}
