// src/exec/mod.rs

//! Job execution layer.
//!
//! - [`backend`] defines [`JobSpec`] and the [`JobExecutor`] seam the runner
//!   calls, which tests replace with a fake.
//! - [`shell`] is the production executor, running commands with
//!   `tokio::process`.

pub mod backend;
pub mod shell;

pub use backend::{ExecFuture, JobExecutor, JobSpec};
pub use shell::ShellExecutor;
