// src/pool/mod.rs

//! Bounded worker pool.
//!
//! - [`worker_pool`] owns the workers, the job queue and fail-fast policy.
//! - [`job`] defines job ids, results, errors and the result stream.

pub mod job;
pub mod worker_pool;

pub use job::{DrainReport, JobError, JobId, JobResult, JobResults};
pub use worker_pool::{PoolConfig, PoolError, WorkerPool};
