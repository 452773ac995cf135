// src/engine/mod.rs

//! Glue between the scheduling core and the application.
//!
//! - [`bounded_walk`] drives an ordered walk through a worker pool.
//! - [`first_error`] collects failures from concurrent visits.
//! - [`runner`] builds the job graph from a config and runs it.

pub mod bounded_walk;
pub mod first_error;
pub mod runner;

pub use bounded_walk::walk_bounded;
pub use first_error::ErrorCollector;
pub use runner::{
    build_job_dag, default_max_workers, run_jobs, RunOptions, RunReport, Selection,
};
