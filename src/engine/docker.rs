//! Docker backend.
//!
//! Maps execution onto the Docker CLI:
//! ```bash
//! docker exec [-w DIR] CONTAINER CMD [ARG...]
//! ```
//!
//! The tokenized command is appended as discrete argv entries, so
//! embedded spaces and quotes in any single token survive intact and
//! nothing is ever routed through `sh -c`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{prepare, ContainerEngine, EngineIdentity, ExecRequest, ExecResult};
use crate::error::EngineError;
use crate::process::{Invocation, ProcessRunner, TokioRunner};

/// `docker` reserves this exit status for failures of the CLI itself,
/// as opposed to the executed command's own exit status.
const RUNTIME_FAILURE_EXIT: i32 = 125;

/// Stderr line prefixes the docker CLI emits when it cannot reach the
/// daemon or the container. Anchored at line start so output of the
/// executed command is never mistaken for a CLI failure.
const CLI_ERROR_PREFIXES: &[&str] = &[
    "Error response from daemon:",
    "Cannot connect to the Docker daemon",
];

/// Executes commands in running containers through the `docker` CLI.
///
/// Assumes `docker` is on PATH; its absence surfaces as
/// [`EngineError::ContainerUnavailable`] on first use, not at
/// construction.
pub struct DockerEngine {
    runner: Arc<dyn ProcessRunner>,
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerEngine {
    /// Creates an engine backed by the production process runner.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(TokioRunner::new()))
    }

    /// Creates an engine dispatching through the given runner.
    pub fn with_runner(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    fn build_invocation(request: &ExecRequest, tokens: Vec<String>) -> Invocation {
        let mut args = vec!["exec".to_string()];
        if let Some(workdir) = &request.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        args.push(request.container_id.clone());
        args.extend(tokens);
        Invocation::new("docker", args)
    }

    /// Separates failures of the Docker CLI from failures of the
    /// executed command, which pass through as ordinary results.
    ///
    /// Only the CLI's own failure signals count: its reserved exit
    /// status, or a stderr line it prints itself. Whatever the executed
    /// command writes to stderr stays part of the result, no matter how
    /// it exits.
    fn classify(result: ExecResult) -> Result<ExecResult, EngineError> {
        if result.exit_code == RUNTIME_FAILURE_EXIT {
            let stderr = result.stderr_lossy();
            let message = stderr.trim();
            return Err(EngineError::container_unavailable(if message.is_empty() {
                "docker exec failed. Is Docker running?".to_string()
            } else {
                message.to_string()
            }));
        }

        if !result.success() {
            let stderr = result.stderr_lossy();
            if let Some(line) = stderr
                .lines()
                .find(|line| CLI_ERROR_PREFIXES.iter().any(|p| line.starts_with(p)))
            {
                return Err(EngineError::container_unavailable(line.trim()));
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    fn identity(&self) -> EngineIdentity {
        EngineIdentity::Docker
    }

    async fn exec_in_container(&self, request: &ExecRequest) -> Result<ExecResult, EngineError> {
        let tokens = prepare(request)?;
        let invocation = Self::build_invocation(request, tokens);
        debug!(
            "docker exec in {}: {:?}",
            request.container_id, invocation.args
        );

        let result = self.runner.run(&invocation, request.timeout).await?;
        Self::classify(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32, stderr: &str) -> ExecResult {
        ExecResult {
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
            exit_code,
        }
    }

    #[test]
    fn test_argv_with_workdir() {
        let request = ExecRequest::new("cid-1", "echo 'hello world'").with_workdir("/workspace");
        let tokens = prepare(&request).unwrap();
        let invocation = DockerEngine::build_invocation(&request, tokens);

        assert_eq!(invocation.program, "docker");
        assert_eq!(
            invocation.args,
            vec!["exec", "-w", "/workspace", "cid-1", "echo", "hello world"]
        );
        assert!(!invocation.args.iter().any(|a| a == "sh" || a == "-c"));
    }

    #[test]
    fn test_argv_omits_workdir_pair_when_absent() {
        let request = ExecRequest::new("cid-1", "ls -la");
        let tokens = prepare(&request).unwrap();
        let invocation = DockerEngine::build_invocation(&request, tokens);

        assert_eq!(invocation.args, vec!["exec", "cid-1", "ls", "-la"]);
    }

    #[test]
    fn test_classify_passes_ordinary_exits_through() {
        assert!(DockerEngine::classify(result(0, "")).unwrap().success());
        // A failing command is a successful exec with a nonzero code.
        let failed = DockerEngine::classify(result(2, "grep: no matches")).unwrap();
        assert_eq!(failed.exit_code, 2);
    }

    #[test]
    fn test_classify_maps_cli_failure_exit() {
        let err = DockerEngine::classify(result(
            125,
            "Error response from daemon: No such container: cid-1\n",
        ))
        .unwrap_err();
        assert!(err.is_container_unavailable());
        assert!(err.to_string().contains("No such container"));
    }

    #[test]
    fn test_classify_maps_anchored_cli_lines_on_nonzero_exit() {
        let err = DockerEngine::classify(result(
            1,
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock\n",
        ))
        .unwrap_err();
        assert!(err.is_container_unavailable());

        let err = DockerEngine::classify(result(
            1,
            "Error response from daemon: container cid-1 is not running\n",
        ))
        .unwrap_err();
        assert!(err.is_container_unavailable());
    }

    #[test]
    fn test_classify_leaves_command_not_found_exits_alone() {
        // Exit 127 with the shell's own wording belongs to the executed
        // command, not the runtime CLI.
        let passed = DockerEngine::classify(result(
            127,
            "bash: line 1: missing-tool: command not found\n",
        ))
        .unwrap();
        assert_eq!(passed.exit_code, 127);
    }

    #[test]
    fn test_classify_leaves_command_stderr_mentioning_not_running_alone() {
        // A status tool reporting on some service may echo the same
        // words the daemon uses; mid-output text is never a CLI signal.
        let passed = DockerEngine::classify(result(3, "nginx is not running\n")).unwrap();
        assert_eq!(passed.exit_code, 3);
        assert_eq!(passed.stderr_lossy(), "nginx is not running\n");
    }

    #[test]
    fn test_identity() {
        assert_eq!(DockerEngine::new().identity(), EngineIdentity::Docker);
    }
}
