// ABOUTME: Capability trait for one remote execution context.
// ABOUTME: Pipes, start/shell, out-of-band requests and a tagged exit outcome.

use super::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

/// How a remote process, or any relay unit racing alongside it, finished.
#[derive(Debug)]
pub enum ExitOutcome {
    /// Finished without error (exit status 0, or a stream reached its end).
    Clean,
    /// The process exited with a non-zero status.
    Exited(u32),
    Failed(Error),
}

impl ExitOutcome {
    /// Outcome for a raw exit status.
    pub fn from_status(status: u32) -> Self {
        if status == 0 {
            ExitOutcome::Clean
        } else {
            ExitOutcome::Exited(status)
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ExitOutcome::Clean)
    }
}

impl From<Result<()>> for ExitOutcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => ExitOutcome::Clean,
            Err(e) => ExitOutcome::Failed(e),
        }
    }
}

/// One remote session on which exactly one command or shell is started.
///
/// Pipes are claimed before starting, each at most once. The returned
/// streams are independent and may be driven from different tasks.
#[async_trait]
pub trait RemoteSession: Send + Sync + 'static {
    /// Writer feeding the remote process's stdin.
    type Stdin: AsyncWrite + Send + Unpin + 'static;
    /// Reader for the remote process's stdout or stderr.
    type Output: AsyncRead + Send + Unpin + 'static;

    fn stdin_pipe(&self) -> Result<Self::Stdin>;

    fn stdout_pipe(&self) -> Result<Self::Output>;

    fn stderr_pipe(&self) -> Result<Self::Output>;

    /// Start `command` non-interactively.
    async fn start(&self, command: &str) -> Result<()>;

    /// Start the login shell.
    async fn shell(&self) -> Result<()>;

    /// Send an out-of-band channel request with a pre-encoded payload.
    async fn send_request(&self, kind: &str, want_reply: bool, payload: Bytes) -> Result<()>;

    /// Wait for the started process to exit.
    async fn wait(&self) -> ExitOutcome;

    /// Close the session and the connection it belongs to.
    async fn close(&self) -> Result<()>;
}
