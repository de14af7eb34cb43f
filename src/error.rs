//! Domain-specific error types for the execution engine.
//!
//! Typed errors enable callers to match on specific failure modes
//! rather than parsing error message strings. A nonzero exit code of the
//! executed command is deliberately NOT represented here: that is a
//! normal [`ExecResult`](crate::ExecResult), not an engine failure.

use std::time::Duration;

use crate::shell::ShellSyntaxError;

/// Errors that can occur while executing a command in a container.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The command string was rejected before any process was spawned.
    #[error("command rejected: {0}")]
    ShellSyntax(#[from] ShellSyntaxError),

    /// The runtime CLI or daemon could not reach the target container,
    /// or the runtime binary itself is missing from PATH.
    #[error("container is unavailable: {message}")]
    ContainerUnavailable { message: String },

    /// The command did not finish within the requested timeout. The
    /// child process is terminated and reaped before this is returned.
    #[error("command timed out after {}ms", limit.as_millis())]
    Timeout { limit: Duration },

    /// The request itself was malformed; nothing was tokenized or run.
    #[error("invalid exec request: {message}")]
    InvalidRequest { message: String },
}

impl EngineError {
    /// Creates a `ContainerUnavailable` error.
    pub fn container_unavailable(message: impl Into<String>) -> Self {
        Self::ContainerUnavailable {
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error from the exceeded limit.
    pub fn timeout(limit: Duration) -> Self {
        Self::Timeout { limit }
    }

    /// Creates an `InvalidRequest` error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Returns true if the command was rejected for shell syntax.
    pub fn is_shell_syntax(&self) -> bool {
        matches!(self, Self::ShellSyntax(_))
    }

    /// Returns true if the container could not be reached.
    pub fn is_container_unavailable(&self) -> bool {
        matches!(self, Self::ContainerUnavailable { .. })
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the request failed validation.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }
}
