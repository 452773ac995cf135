// src/exec/backend.rs

//! Pluggable job executor abstraction.
//!
//! The runner talks to a [`JobExecutor`] instead of spawning processes
//! itself, so tests can substitute an executor that records calls and never
//! touches the OS. Production code uses
//! [`ShellExecutor`](crate::exec::ShellExecutor).

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::config::{ConfigFile, JobConfig};

/// Everything needed to run one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub cmd: String,
    /// Working directory; `None` runs in the current directory.
    pub dir: Option<PathBuf>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            dir: None,
        }
    }

    pub fn from_config(name: &str, job: &JobConfig, cfg: &ConfigFile) -> Self {
        Self {
            name: name.to_string(),
            cmd: job.cmd.clone(),
            dir: cfg.working_dir(job),
        }
    }
}

impl fmt::Display for JobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.cmd)
    }
}

pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Runs jobs.
///
/// Implementations should stop promptly once `cancel` fires and return an
/// error in that case.
pub trait JobExecutor: Send + Sync {
    fn run<'a>(&'a self, job: &'a JobSpec, cancel: CancellationToken) -> ExecFuture<'a>;
}
