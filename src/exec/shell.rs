// src/exec/shell.rs

//! Runs a job as a shell command.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::exec::backend::{ExecFuture, JobExecutor, JobSpec};

/// Executor that runs `cmd` through `sh -c` (`cmd /C` on Windows).
///
/// Output is forwarded line by line, prefixed with `[job-name]`: stdout lines
/// to stdout, stderr lines to stderr. The child is killed when the token is
/// cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl JobExecutor for ShellExecutor {
    fn run<'a>(&'a self, job: &'a JobSpec, cancel: CancellationToken) -> ExecFuture<'a> {
        Box::pin(run_job(job, cancel))
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

async fn run_job(job: &JobSpec, cancel: CancellationToken) -> Result<()> {
    info!(job = %job.name, cmd = %job.cmd, "starting job process");

    let mut cmd = shell_command(&job.cmd);
    if let Some(dir) = &job.dir {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for job '{}'", job.name))?;

    let forwarders: Vec<_> = [
        child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(job.name.clone(), out, Stream::Stdout))),
        child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(job.name.clone(), err, Stream::Stderr))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = tokio::select! {
        status = child.wait() => {
            status.with_context(|| format!("waiting for process of job '{}'", job.name))?
        }
        _ = cancel.cancelled() => {
            info!(job = %job.name, "cancellation requested; killing job process");
            if let Err(e) = child.kill().await {
                warn!(job = %job.name, error = %e, "failed to kill job process");
            }
            bail!("job '{}' cancelled", job.name);
        }
    };

    // Flush the remaining output before reporting.
    for handle in forwarders {
        if let Err(e) = handle.await {
            debug!(job = %job.name, error = %e, "output forwarder ended abnormally");
        }
    }

    info!(
        job = %job.name,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "job process exited"
    );

    if !status.success() {
        bail!("job '{}' failed with {}", job.name, status);
    }
    Ok(())
}

async fn forward_lines<R>(job: String, reader: R, stream: Stream)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match stream {
                Stream::Stdout => println!("[{job}] {line}"),
                Stream::Stderr => eprintln!("[{job}] {line}"),
            },
            Ok(None) => break,
            Err(e) => {
                debug!(job = %job, ?stream, error = %e, "stopped reading job output");
                break;
            }
        }
    }
}
