// ABOUTME: Scripted in-memory RemoteSession for relay tests.
// ABOUTME: The test plays the remote process through the returned RemoteProcess ends.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, DuplexStream};
use tokio::sync::oneshot;
use upstream_relay::ssh::{Error, ExitOutcome, RemoteSession, Result, Stream};

const PIPE_CAPACITY: usize = 1 << 16;

/// Process side of a fake session, driven by the test.
pub struct RemoteProcess {
    /// What the process reads from its stdin.
    pub stdin: DuplexStream,
    pub stdout: DuplexStream,
    pub stderr: DuplexStream,
    exit: Option<oneshot::Sender<ExitOutcome>>,
}

impl RemoteProcess {
    /// Report the process as exited; only the first call counts.
    pub fn exit(&mut self, outcome: ExitOutcome) {
        if let Some(tx) = self.exit.take() {
            let _ = tx.send(outcome);
        }
    }
}

struct Pipes {
    stdin: Option<DuplexStream>,
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    started: Option<String>,
    closed: bool,
}

pub struct FakeSession {
    pipes: Mutex<Pipes>,
    exit: Mutex<Option<oneshot::Receiver<ExitOutcome>>>,
    requests: Mutex<Vec<(String, bool, Bytes)>>,
    fail_start: bool,
    fail_pipe: Option<Stream>,
}

/// A fresh session and the process behind it.
pub fn fake_session() -> (FakeSession, RemoteProcess) {
    let (stdin_local, stdin_remote) = tokio::io::duplex(PIPE_CAPACITY);
    let (stdout_local, stdout_remote) = tokio::io::duplex(PIPE_CAPACITY);
    let (stderr_local, stderr_remote) = tokio::io::duplex(PIPE_CAPACITY);
    let (exit_tx, exit_rx) = oneshot::channel();

    let session = FakeSession {
        pipes: Mutex::new(Pipes {
            stdin: Some(stdin_local),
            stdout: Some(stdout_local),
            stderr: Some(stderr_local),
            started: None,
            closed: false,
        }),
        exit: Mutex::new(Some(exit_rx)),
        requests: Mutex::new(Vec::new()),
        fail_start: false,
        fail_pipe: None,
    };
    let process = RemoteProcess {
        stdin: stdin_remote,
        stdout: stdout_remote,
        stderr: stderr_remote,
        exit: Some(exit_tx),
    };
    (session, process)
}

impl FakeSession {
    /// Refuse to start any command or shell.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Fail to hand out the given pipe.
    pub fn failing_pipe(mut self, stream: Stream) -> Self {
        self.fail_pipe = Some(stream);
        self
    }

    /// The command started, `<shell>` for a shell, or `None`.
    pub fn started(&self) -> Option<String> {
        self.pipes.lock().started.clone()
    }

    pub fn closed(&self) -> bool {
        self.pipes.lock().closed
    }

    /// Whether nobody has waited on the process yet.
    pub fn wait_untouched(&self) -> bool {
        self.exit.lock().is_some()
    }

    pub fn requests(&self) -> Vec<(String, bool, Bytes)> {
        self.requests.lock().clone()
    }

    fn claim(&self, stream: Stream) -> Result<DuplexStream> {
        if self.fail_pipe == Some(stream) {
            return Err(Error::Io(io::Error::other("pipe unavailable")));
        }
        let mut pipes = self.pipes.lock();
        if pipes.started.is_some() {
            return Err(Error::AlreadyStarted);
        }
        let slot = match stream {
            Stream::Stdin => &mut pipes.stdin,
            Stream::Stdout => &mut pipes.stdout,
            Stream::Stderr => &mut pipes.stderr,
        };
        slot.take().ok_or(Error::PipeTaken(stream))
    }

    fn begin(&self, what: &str) -> Result<()> {
        let mut pipes = self.pipes.lock();
        if pipes.started.is_some() {
            return Err(Error::AlreadyStarted);
        }
        if self.fail_start {
            return Err(Error::Rejected("exec"));
        }
        pipes.started = Some(what.to_string());
        Ok(())
    }
}

#[async_trait]
impl RemoteSession for FakeSession {
    type Stdin = DuplexStream;
    type Output = DuplexStream;

    fn stdin_pipe(&self) -> Result<Self::Stdin> {
        self.claim(Stream::Stdin)
    }

    fn stdout_pipe(&self) -> Result<Self::Output> {
        self.claim(Stream::Stdout)
    }

    fn stderr_pipe(&self) -> Result<Self::Output> {
        self.claim(Stream::Stderr)
    }

    async fn start(&self, command: &str) -> Result<()> {
        self.begin(command)
    }

    async fn shell(&self) -> Result<()> {
        self.begin("<shell>")
    }

    async fn send_request(&self, kind: &str, want_reply: bool, payload: Bytes) -> Result<()> {
        self.requests
            .lock()
            .push((kind.to_string(), want_reply, payload));
        Ok(())
    }

    async fn wait(&self) -> ExitOutcome {
        if self.started().is_none() {
            return ExitOutcome::Failed(Error::NotStarted);
        }
        let rx = self.exit.lock().take();
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or(ExitOutcome::Failed(Error::ChannelClosed)),
            None => ExitOutcome::Failed(Error::NotStarted),
        }
    }

    async fn close(&self) -> Result<()> {
        self.pipes.lock().closed = true;
        Ok(())
    }
}

/// Caller-side writer that accepts only half of every write.
pub struct HalfWriter;

impl AsyncWrite for HalfWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len() / 2))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
