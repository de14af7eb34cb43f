//! Shell-free command execution inside running containers.
//!
//! Agent runtimes generate command strings dynamically and need to run
//! them inside an isolated container. Handing those strings to a shell
//! in the container would open command-injection holes, so this crate
//! never does: a pure tokenizer splits the string under minimal quoting
//! rules and hard-rejects shell metacharacters, and the resulting
//! argument vector is dispatched to the container runtime's CLI as
//! discrete `execve` arguments.
//!
//! Two backends implement the [`ContainerEngine`] contract:
//! [`DockerEngine`] (the `docker` CLI) and [`AppleContainerEngine`]
//! (Apple's `container` CLI). Both are stateless and safe to share
//! across concurrent calls.
//!
//! ```no_run
//! use std::time::Duration;
//! use execbox::{ContainerEngine, DockerEngine, ExecRequest};
//!
//! # async fn demo() -> Result<(), execbox::EngineError> {
//! let engine = DockerEngine::new();
//! let request = ExecRequest::new("cid-1", "echo 'hello world'")
//!     .with_workdir("/workspace")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let result = engine.exec_in_container(&request).await?;
//! // A nonzero exit code is a normal result, not an engine error.
//! println!("[{}] {}", result.exit_code, result.stdout_lossy());
//! # Ok(())
//! # }
//! ```
//!
//! Container lifecycle (creation, image pulls, networking) is out of
//! scope: callers bring the ID of an already-running container. The
//! crate emits `tracing` events and leaves subscriber setup to the host
//! application.

mod engine;
mod error;
mod process;
pub mod shell;

pub use engine::{
    AppleContainerEngine, ContainerEngine, DockerEngine, EngineIdentity, ExecRequest, ExecResult,
};
pub use error::EngineError;
pub use process::{Invocation, ProcessRunner, TokioRunner, DEFAULT_MAX_OUTPUT_BYTES};
pub use shell::ShellSyntaxError;
