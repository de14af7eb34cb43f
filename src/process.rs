//! Subprocess ownership for a single invocation.
//!
//! The runner spawns a binary with a discrete argument vector (execve
//! semantics, never `sh -c`), drains stdout and stderr as they arrive,
//! and resolves with the exit status. With a deadline set, an overdue
//! child is killed and reaped before the timeout error is surfaced, so
//! no call ever leaves an orphaned process behind.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::engine::ExecResult;
use crate::error::EngineError;

/// Default per-stream cap on captured output, in bytes.
///
/// Output past the cap is drained and discarded so the child never
/// blocks on a full pipe. Raise the cap with
/// [`TokioRunner::with_output_limit`] when more capture is needed.
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 8 * 1024 * 1024;

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Binary to execute, resolved through PATH by the OS.
    pub program: String,
    /// Argument vector passed verbatim, one OS-level argument per entry.
    pub args: Vec<String>,
}

impl Invocation {
    /// Creates an invocation from a program name and its arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Trait for spawning one external process and collecting its output.
///
/// [`TokioRunner`] is the production implementation; tests substitute a
/// recording double to prove that rejected commands never spawn.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the invocation to completion, or until `timeout` elapses.
    ///
    /// A nonzero exit code is a normal [`ExecResult`], not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ContainerUnavailable`] when the binary
    /// cannot be spawned or its pipes fail, and [`EngineError::Timeout`]
    /// when the deadline passes; in the timeout case the child has been
    /// terminated and reaped before the error is returned.
    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<ExecResult, EngineError>;
}

/// Production process runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioRunner {
    max_output_bytes: u64,
}

impl Default for TokioRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioRunner {
    /// Creates a runner with the default output cap.
    pub fn new() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Creates a runner capturing at most `max_output_bytes` per stream.
    pub fn with_output_limit(max_output_bytes: u64) -> Self {
        Self { max_output_bytes }
    }
}

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<ExecResult, EngineError> {
        debug!("Spawning {} {:?}", invocation.program, invocation.args);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Backstop only; the paths below always reap explicitly.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&invocation.program, &e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = match timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(
                    limit,
                    wait_and_collect(&mut child, stdout, stderr, self.max_output_bytes),
                )
                .await;
                match waited {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        // Deadline passed: terminate, then reap before
                        // surfacing the error.
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        return Err(EngineError::timeout(limit));
                    }
                }
            }
            None => wait_and_collect(&mut child, stdout, stderr, self.max_output_bytes).await,
        };

        outcome.map_err(|e| {
            EngineError::container_unavailable(format!(
                "failed to run `{}`: {e}",
                invocation.program
            ))
        })
    }
}

/// Awaits child exit while draining both pipes concurrently.
async fn wait_and_collect(
    child: &mut Child,
    stdout: Option<impl AsyncRead + Unpin>,
    stderr: Option<impl AsyncRead + Unpin>,
    cap: u64,
) -> std::io::Result<ExecResult> {
    let (status, stdout, stderr) = tokio::join!(
        child.wait(),
        read_capped(stdout, cap, "stdout"),
        read_capped(stderr, cap, "stderr"),
    );
    let status = status?;

    Ok(ExecResult {
        stdout: stdout?,
        stderr: stderr?,
        // None means signal-terminated on unix.
        exit_code: status.code().unwrap_or(-1),
    })
}

/// Reads a pipe to EOF, keeping at most `cap` bytes.
async fn read_capped(
    pipe: Option<impl AsyncRead + Unpin>,
    cap: u64,
    stream: &str,
) -> std::io::Result<Vec<u8>> {
    let Some(mut pipe) = pipe else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    (&mut pipe).take(cap).read_to_end(&mut buf).await?;

    // Keep draining past the cap so the child never stalls on a full
    // pipe; the excess is discarded.
    let discarded = tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;
    if discarded > 0 {
        warn!(
            "{} exceeded the {} byte capture cap; {} bytes discarded",
            stream, cap, discarded
        );
    }

    Ok(buf)
}

fn spawn_error(program: &str, err: &std::io::Error) -> EngineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        EngineError::container_unavailable(format!(
            "`{program}` not found on PATH. Is the container runtime installed?"
        ))
    } else {
        EngineError::container_unavailable(format!("failed to spawn `{program}`: {err}"))
    }
}
