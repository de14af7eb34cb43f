//! Container runtime engines.
//!
//! This module provides a unified interface for executing commands
//! inside an already-running container through different runtime CLIs:
//! - Docker: `docker exec [-w DIR] CONTAINER CMD...`
//! - Apple container: `container exec CONTAINER CMD...`
//!
//! Backends are interchangeable implementations of [`ContainerEngine`];
//! adding a runtime means adding an implementation, never branching on a
//! runtime-name string at call sites.

mod apple;
mod docker;

pub use apple::AppleContainerEngine;
pub use docker::DockerEngine;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::shell;

/// A request to execute one command inside a running container.
///
/// Borrowed by the engine for the duration of a single call; nothing is
/// retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Opaque identifier of a running container. Must be non-empty.
    pub container_id: String,
    /// Absolute working directory inside the container, if any.
    pub workdir: Option<String>,
    /// Shell-like command line; tokenized by the engine, never handed
    /// to a shell.
    pub command: String,
    /// Deadline for the command. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ExecRequest {
    /// Creates a request with no working directory and no timeout.
    pub fn new(container_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            workdir: None,
            command: command.into(),
            timeout: None,
        }
    }

    /// Sets the working directory inside the container.
    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Sets the execution deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Captured output and exit status of an executed command.
///
/// A nonzero `exit_code` means the command failed, not the engine;
/// engine failures surface as [`EngineError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Bytes the command wrote to stdout, in arrival order.
    pub stdout: Vec<u8>,
    /// Bytes the command wrote to stderr, in arrival order.
    pub stderr: Vec<u8>,
    /// Exit status of the command; `-1` if it was signal-terminated.
    pub exit_code: i32,
}

impl ExecResult {
    /// Returns true if the command exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns stdout decoded as UTF-8, with invalid bytes replaced.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Returns stderr decoded as UTF-8, with invalid bytes replaced.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Identity of a concrete runtime backend, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineIdentity {
    /// Docker CLI (`docker`).
    Docker,
    /// Apple container CLI (`container`).
    AppleContainer,
}

impl std::fmt::Display for EngineIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::AppleContainer => write!(f, "apple-container"),
        }
    }
}

impl std::str::FromStr for EngineIdentity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "apple-container" => Ok(Self::AppleContainer),
            _ => Err(EngineError::invalid_request(format!(
                "unknown container runtime: '{s}'. Supported: docker, apple-container"
            ))),
        }
    }
}

/// Trait for container runtime backends.
///
/// Implementations are stateless beyond their fixed identity and runner
/// handle, so one instance may serve any number of concurrent calls.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Returns which runtime backend this engine drives.
    fn identity(&self) -> EngineIdentity;

    /// Executes a command inside the container named by the request.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidRequest`] for a malformed request.
    /// - [`EngineError::ShellSyntax`] when the command cannot be
    ///   tokenized safely; no process is spawned.
    /// - [`EngineError::ContainerUnavailable`] when the runtime CLI or
    ///   daemon cannot reach the container.
    /// - [`EngineError::Timeout`] when the deadline elapses; the child
    ///   is terminated and reaped first.
    async fn exec_in_container(&self, request: &ExecRequest) -> Result<ExecResult, EngineError>;
}

/// Validates a request and tokenizes its command.
///
/// Shared front half of every backend's `exec_in_container`: all
/// rejections happen here, before any process is spawned.
pub(crate) fn prepare(request: &ExecRequest) -> Result<Vec<String>, EngineError> {
    if request.container_id.is_empty() {
        return Err(EngineError::invalid_request("container id is empty"));
    }
    if let Some(workdir) = &request.workdir {
        if !workdir.starts_with('/') {
            return Err(EngineError::invalid_request(format!(
                "workdir must be an absolute path, got '{workdir}'"
            )));
        }
    }
    if request.timeout == Some(Duration::ZERO) {
        return Err(EngineError::invalid_request("timeout must be positive"));
    }

    let tokens = shell::split(&request.command)?;
    if tokens.is_empty() {
        return Err(EngineError::invalid_request("command is empty"));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        assert_eq!(format!("{}", EngineIdentity::Docker), "docker");
        assert_eq!(
            format!("{}", EngineIdentity::AppleContainer),
            "apple-container"
        );
    }

    #[test]
    fn test_identity_from_str() {
        assert_eq!(
            "docker".parse::<EngineIdentity>().unwrap(),
            EngineIdentity::Docker
        );
        assert_eq!(
            "Apple-Container".parse::<EngineIdentity>().unwrap(),
            EngineIdentity::AppleContainer
        );
        assert!("podman".parse::<EngineIdentity>().is_err());
    }

    #[test]
    fn test_request_builder() {
        let request = ExecRequest::new("cid-1", "echo hi")
            .with_workdir("/workspace")
            .with_timeout(Duration::from_secs(30));
        assert_eq!(request.container_id, "cid-1");
        assert_eq!(request.workdir.as_deref(), Some("/workspace"));
        assert_eq!(request.command, "echo hi");
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_result_success_and_lossy_accessors() {
        let result = ExecResult {
            stdout: b"out\n".to_vec(),
            stderr: b"".to_vec(),
            exit_code: 0,
        };
        assert!(result.success());
        assert_eq!(result.stdout_lossy(), "out\n");
        assert_eq!(result.stderr_lossy(), "");

        let failed = ExecResult {
            stdout: Vec::new(),
            stderr: b"boom".to_vec(),
            exit_code: 2,
        };
        assert!(!failed.success());
    }

    #[test]
    fn test_prepare_tokenizes_valid_request() {
        let request = ExecRequest::new("cid-1", "echo 'hello world'");
        assert_eq!(prepare(&request).unwrap(), vec!["echo", "hello world"]);
    }

    #[test]
    fn test_prepare_rejects_empty_container_id() {
        let err = prepare(&ExecRequest::new("", "echo hi")).unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_prepare_rejects_empty_command() {
        let err = prepare(&ExecRequest::new("cid-1", "   ")).unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_prepare_rejects_relative_workdir() {
        let request = ExecRequest::new("cid-1", "ls").with_workdir("workspace");
        assert!(prepare(&request).unwrap_err().is_invalid_request());
    }

    #[test]
    fn test_prepare_rejects_zero_timeout() {
        let request = ExecRequest::new("cid-1", "ls").with_timeout(Duration::ZERO);
        assert!(prepare(&request).unwrap_err().is_invalid_request());
    }

    #[test]
    fn test_prepare_propagates_shell_syntax() {
        let err = prepare(&ExecRequest::new("cid-1", "echo ok; whoami")).unwrap_err();
        assert!(err.is_shell_syntax());
    }
}
