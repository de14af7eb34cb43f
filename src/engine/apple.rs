//! Apple container backend.
//!
//! Maps execution onto Apple's native container CLI:
//! ```bash
//! container exec CONTAINER CMD [ARG...]
//! ```
//!
//! This CLI has no working-directory flag. A request carrying `workdir`
//! still succeeds; the ignored hint is reported through a warning so
//! callers can tell the difference from honored selection.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{prepare, ContainerEngine, EngineIdentity, ExecRequest, ExecResult};
use crate::error::EngineError;
use crate::process::{Invocation, ProcessRunner, TokioRunner};

/// Fragments of the `container` CLI's own `Error:` lines that mean the
/// runtime service is unreachable, independent of any container name.
const CLI_ERROR_MARKERS: &[&str] = &["failed to connect", "xpc connection"];

/// Executes commands in running containers through Apple's `container`
/// CLI.
///
/// Assumes `container` is on PATH; its absence surfaces as
/// [`EngineError::ContainerUnavailable`] on first use, not at
/// construction.
pub struct AppleContainerEngine {
    runner: Arc<dyn ProcessRunner>,
}

impl Default for AppleContainerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AppleContainerEngine {
    /// Creates an engine backed by the production process runner.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(TokioRunner::new()))
    }

    /// Creates an engine dispatching through the given runner.
    pub fn with_runner(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    fn build_invocation(request: &ExecRequest, tokens: Vec<String>) -> Invocation {
        let mut args = vec!["exec".to_string(), request.container_id.clone()];
        args.extend(tokens);
        Invocation::new("container", args)
    }

    /// Separates failures of the runtime CLI from failures of the
    /// executed command, which pass through as ordinary results.
    ///
    /// The `container` CLI reports its own failures on stderr lines
    /// prefixed with `Error:`; only such a line counts, and only when
    /// it names the requested container or the runtime service itself.
    /// Whatever the executed command writes to stderr stays part of the
    /// result, no matter how it exits.
    fn classify(container_id: &str, result: ExecResult) -> Result<ExecResult, EngineError> {
        if !result.success() {
            let stderr = result.stderr_lossy();
            if let Some(line) = stderr.lines().find(|line| {
                line.starts_with("Error:") && {
                    let lowered = line.to_lowercase();
                    lowered.contains(&container_id.to_lowercase())
                        || CLI_ERROR_MARKERS.iter().any(|m| lowered.contains(m))
                }
            }) {
                return Err(EngineError::container_unavailable(line.trim()));
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl ContainerEngine for AppleContainerEngine {
    fn identity(&self) -> EngineIdentity {
        EngineIdentity::AppleContainer
    }

    async fn exec_in_container(&self, request: &ExecRequest) -> Result<ExecResult, EngineError> {
        let tokens = prepare(request)?;

        if let Some(workdir) = &request.workdir {
            warn!(
                "`container exec` has no working-directory flag; ignoring workdir '{}' for {}",
                workdir, request.container_id
            );
        }

        let invocation = Self::build_invocation(request, tokens);
        debug!(
            "container exec in {}: {:?}",
            request.container_id, invocation.args
        );

        let result = self.runner.run(&invocation, request.timeout).await?;
        Self::classify(&request.container_id, result)
    }
}
