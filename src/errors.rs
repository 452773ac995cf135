// src/errors.rs

//! Crate-wide error type for the application layer.
//!
//! The scheduling core has its own narrower enums
//! ([`GraphError`](crate::dag::GraphError), [`PoolError`](crate::pool::PoolError),
//! [`JobError`](crate::pool::JobError)). Graph errors convert into
//! [`TaskdagError`]; pool and job failures reach it as a [`RunReport`].
//!
//! [`RunReport`]: crate::engine::RunReport

use std::path::PathBuf;

use thiserror::Error;

use crate::dag::GraphError;

#[derive(Error, Debug)]
pub enum TaskdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No config file found (looked for {names} from {start} upwards)")]
    ConfigNotFound { start: PathBuf, names: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Cycle detected in job graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("job '{job}' failed: {message}")]
    JobFailed { job: String, message: String },

    #[error("run cancelled before every job finished")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaskdagError>;
