// ABOUTME: Upstream wrapper around one remote session and its connection.
// ABOUTME: Runs a command or shell and relays stdio against a caller's duplex stream.

use super::channel::ChannelSession;
use super::client::{self, ClientHandler, DialConfig};
use super::combined::Combined;
use super::error::{Error, Result, Stream};
use super::prefix::Prefix;
use super::pty::PtyRequest;
use super::relay::{self, SharedWriter};
use super::session::{ExitOutcome, RemoteSession};
use bytes::Bytes;
use futures::FutureExt;
use russh::client::Handle;
use russh::keys::ssh_key::PrivateKey;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;

/// One remote execution context: a session, the connection it lives on,
/// and the prefix appended to shell output.
///
/// A session runs exactly one command or shell. Create a new upstream for
/// every invocation and close it when done.
pub struct Upstream<S: RemoteSession = ChannelSession> {
    addr: String,
    session: Arc<S>,
    prefix: Arc<Prefix>,
}

impl<S: RemoteSession> fmt::Debug for Upstream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upstream")
            .field("addr", &self.addr)
            .field("session", &"<RemoteSession>")
            .field("prefix", &self.prefix.get())
            .finish()
    }
}

impl<S: RemoteSession> fmt::Display for Upstream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream(addr={})", self.addr)
    }
}

impl Upstream<ChannelSession> {
    /// Open a session on an already authenticated connection.
    ///
    /// The connection is disconnected if the session cannot be opened.
    pub async fn open(client: Handle<ClientHandler>, addr: impl Into<String>) -> Result<Self> {
        let session = ChannelSession::open(Arc::new(client)).await?;
        Ok(Self::new(session, addr))
    }

    /// Connect, authenticate with the first accepted key and open a session.
    pub async fn dial(config: &DialConfig, keys: &[Arc<PrivateKey>]) -> Result<Self> {
        let client = client::connect(config, keys).await?;
        Self::open(client, config.addr()).await
    }

    /// The connection this upstream's session belongs to.
    pub fn client(&self) -> &Arc<Handle<ClientHandler>> {
        self.session.client()
    }
}

impl<S: RemoteSession> Upstream<S> {
    pub fn new(session: S, addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            session: Arc::new(session),
            prefix: Arc::new(Prefix::new()),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Set the bytes appended to every subsequent shell output chunk.
    pub fn set_prefix(&self, prefix: impl Into<Bytes>) {
        self.prefix.set(prefix);
    }

    pub fn clear_prefix(&self) {
        self.prefix.clear();
    }

    pub fn prefix(&self) -> Option<Bytes> {
        self.prefix.get()
    }

    /// Wait for the started command or shell to exit.
    pub async fn wait(&self) -> ExitOutcome {
        self.session.wait().await
    }

    /// Close the session and its connection.
    pub async fn close(&self) -> Result<()> {
        tracing::debug!(upstream = %self, "closing");
        self.session.close().await
    }

    /// Start `command` and expose its stdout and stdin as one duplex stream.
    ///
    /// stderr is not exposed; use [`Upstream::pipe_command`] for that. The
    /// caller drives the stream and later waits on or closes the upstream.
    pub async fn command_rw(&self, command: &str) -> Result<Combined<S::Output, S::Stdin>> {
        let stdout = self
            .session
            .stdout_pipe()
            .map_err(|e| Error::pipe(Stream::Stdout, e))?;
        let stdin = self
            .session
            .stdin_pipe()
            .map_err(|e| Error::pipe(Stream::Stdin, e))?;

        self.session
            .start(command)
            .await
            .map_err(|e| Error::start(command, e))?;
        tracing::debug!(upstream = %self, command, "started command");

        Ok(Combined::new(stdout, stdin))
    }

    /// Run `command`, relaying `channel` to its stdin and its stdout and
    /// stderr back to `channel`. Returns the remote exit status.
    ///
    /// Whichever relay finishes first decides the result: the process
    /// exiting, or one of the three streams ending or failing. The rest are
    /// left running until the session closes.
    pub async fn pipe_command<C>(&self, channel: C, command: &str) -> Result<u32>
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (stdin, stdout, stderr) = self.claim_pipes()?;

        self.session
            .start(command)
            .await
            .map_err(|e| Error::start(command, e))?;
        tracing::debug!(upstream = %self, command, "started command relay");

        match self.relay(channel, stdin, stdout, stderr, None).await {
            ExitOutcome::Clean => Ok(0),
            ExitOutcome::Exited(status) => Ok(status),
            ExitOutcome::Failed(e) => Err(Error::status(command, e)),
        }
    }

    /// Start an interactive shell and relay all three streams with `channel`.
    ///
    /// When `pty` is given it is sent once the shell is up, before any
    /// output is relayed. Every stdout and stderr chunk written to `channel`
    /// carries the prefix current at the time it was read.
    pub async fn pipe_shell<C>(&self, channel: C, pty: Option<&PtyRequest>) -> Result<()>
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (stdin, stdout, stderr) = self.claim_pipes()?;

        self.session
            .shell()
            .await
            .map_err(|e| Error::Shell(Box::new(e)))?;
        tracing::debug!(upstream = %self, "started shell");

        if let Some(req) = pty {
            // Best effort: a refused terminal still leaves a usable shell.
            if let Err(e) = self
                .session
                .send_request(PtyRequest::REQUEST_TYPE, false, req.encode())
                .await
            {
                tracing::warn!(upstream = %self, error = %e, "failed to send pty request");
            }
        }

        let prefix = Some(Arc::clone(&self.prefix));
        match self.relay(channel, stdin, stdout, stderr, prefix).await {
            ExitOutcome::Clean => Ok(()),
            ExitOutcome::Exited(status) => Err(Error::Exited(status)),
            ExitOutcome::Failed(e) => Err(e),
        }
    }

    fn claim_pipes(&self) -> Result<(S::Stdin, S::Output, S::Output)> {
        let stderr = self
            .session
            .stderr_pipe()
            .map_err(|e| Error::pipe(Stream::Stderr, e))?;
        let stdout = self
            .session
            .stdout_pipe()
            .map_err(|e| Error::pipe(Stream::Stdout, e))?;
        let stdin = self
            .session
            .stdin_pipe()
            .map_err(|e| Error::pipe(Stream::Stdin, e))?;
        Ok((stdin, stdout, stderr))
    }

    /// Race input, stderr, stdout and process exit; first one decides.
    async fn relay<C>(
        &self,
        channel: C,
        stdin: S::Stdin,
        stdout: S::Output,
        stderr: S::Output,
        prefix: Option<Arc<Prefix>>,
    ) -> ExitOutcome
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(channel);
        let writer: SharedWriter<_> = Arc::new(Mutex::new(writer));
        let session = Arc::clone(&self.session);

        relay::first_finished(vec![
            relay::copy_input(reader, stdin).boxed(),
            relay::copy_output(stderr, Arc::clone(&writer), prefix.clone()).boxed(),
            relay::copy_output(stdout, writer, prefix).boxed(),
            async move { session.wait().await }.boxed(),
        ])
        .await
    }
}
