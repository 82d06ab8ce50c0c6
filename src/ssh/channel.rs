// ABOUTME: RemoteSession implemented on a russh session channel.
// ABOUTME: A driver task owns the channel and splits its messages into stdout, stderr and exit.

use super::client::ClientHandler;
use super::error::{Error, Result, Stream};
use super::pty::{PtyRequest, WindowChange};
use super::session::{ExitOutcome, RemoteSession};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect, Pty, Sig};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::{mpsc, oneshot, watch};

/// Buffered bytes per output pipe before the driver stops reading the channel.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Extended data type code for stderr.
const EXTENDED_DATA_STDERR: u32 = 1;

/// Writer for the remote stdin.
pub type ChannelStdin = Pin<Box<dyn AsyncWrite + Send>>;

/// How the remote side ended, as recorded by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Termination {
    Status(u32),
    Signal(String),
    /// The channel closed without reporting an exit.
    Lost,
}

impl From<Termination> for ExitOutcome {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Status(status) => ExitOutcome::from_status(status),
            Termination::Signal(signal) => ExitOutcome::Exited(signal_status(&signal)),
            Termination::Lost => ExitOutcome::Failed(Error::ChannelClosed),
        }
    }
}

/// Shell-style status for a process killed by `signal`: 128 plus the
/// signal number, or plain 128 when the name is not a standard one.
fn signal_status(signal: &str) -> u32 {
    let number = match signal {
        "HUP" => 1,
        "INT" => 2,
        "QUIT" => 3,
        "ILL" => 4,
        "ABRT" => 6,
        "FPE" => 8,
        "KILL" => 9,
        "USR1" => 10,
        "SEGV" => 11,
        "USR2" => 12,
        "PIPE" => 13,
        "ALRM" => 14,
        "TERM" => 15,
        _ => 0,
    };
    128 + number
}

/// Signal name as sent on the wire, without the `SIG` prefix.
fn signal_name(signal: Sig) -> String {
    match signal {
        Sig::Custom(name) => name,
        other => format!("{:?}", other),
    }
}

/// Requests the driver performs on the channel.
enum Control {
    Exec {
        command: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Shell {
        reply: oneshot::Sender<Result<()>>,
    },
    Pty {
        request: PtyRequest,
        want_reply: bool,
    },
    WindowChange(WindowChange),
    Close,
}

/// Local end of an output pipe until it is claimed.
enum Pipe {
    Unclaimed,
    /// Claimed; holds the end the driver writes into.
    Claimed(DuplexStream),
}

impl Pipe {
    fn claim(&mut self, stream: Stream) -> Result<DuplexStream> {
        match self {
            Pipe::Unclaimed => {
                let (remote, local) = tokio::io::duplex(PIPE_CAPACITY);
                *self = Pipe::Claimed(remote);
                Ok(local)
            }
            Pipe::Claimed(_) => Err(Error::PipeTaken(stream)),
        }
    }

    fn into_writer(self) -> Option<DuplexStream> {
        match self {
            Pipe::Unclaimed => None,
            Pipe::Claimed(writer) => Some(writer),
        }
    }
}

/// Everything gathered before the command or shell starts.
struct Pending<C = Channel<Msg>> {
    channel: C,
    stdin_claimed: bool,
    stdout: Pipe,
    stderr: Pipe,
    queued: Vec<Control>,
    exit: watch::Sender<Option<Termination>>,
}

enum State<C = Channel<Msg>> {
    Idle(Box<Pending<C>>),
    Running(mpsc::UnboundedSender<Control>),
    Closed,
}

impl<C> State<C> {
    /// Queue `control` until start, or pass it to the running driver.
    fn submit(&mut self, control: Control) -> Result<()> {
        match self {
            State::Idle(pending) => {
                pending.queued.push(control);
                Ok(())
            }
            State::Running(control_tx) => control_tx.send(control).map_err(|_| Error::ChannelClosed),
            State::Closed => Err(Error::ChannelClosed),
        }
    }

    /// Move to running; the driver's queue holds the queued requests, then `start`.
    fn begin(
        &mut self,
        start: Control,
    ) -> Result<(Box<Pending<C>>, mpsc::UnboundedReceiver<Control>)> {
        let mut pending = match std::mem::replace(self, State::Closed) {
            State::Idle(pending) => pending,
            other => {
                *self = other;
                return Err(Error::AlreadyStarted);
            }
        };

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        for control in pending.queued.drain(..).chain(std::iter::once(start)) {
            let _ = control_tx.send(control);
        }
        *self = State::Running(control_tx);
        Ok((pending, control_rx))
    }
}

/// Decode an out-of-band request into something the driver can send.
fn request_control(kind: &str, want_reply: bool, payload: &[u8]) -> Result<Control> {
    match kind {
        PtyRequest::REQUEST_TYPE => Ok(Control::Pty {
            request: PtyRequest::decode(payload)?,
            want_reply,
        }),
        WindowChange::REQUEST_TYPE => Ok(Control::WindowChange(WindowChange::decode(payload)?)),
        other => Err(Error::UnsupportedRequest(other.to_string())),
    }
}

/// A russh session channel on a shared connection.
pub struct ChannelSession {
    client: Arc<Handle<ClientHandler>>,
    state: Mutex<State>,
    exit: watch::Receiver<Option<Termination>>,
}

impl std::fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSession")
            .field("client", &"<russh::Handle>")
            .field("exit", &*self.exit.borrow())
            .finish()
    }
}

impl ChannelSession {
    /// Open a session channel, disconnecting `client` if that fails.
    pub async fn open(client: Arc<Handle<ClientHandler>>) -> Result<Self> {
        let channel = match client.channel_open_session().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = client.disconnect(Disconnect::ByApplication, "", "en").await
                {
                    tracing::debug!("disconnect after failed session open: {}", close_err);
                }
                return Err(Error::Protocol(e));
            }
        };

        let (exit_tx, exit_rx) = watch::channel(None);
        let pending = Pending {
            channel,
            stdin_claimed: false,
            stdout: Pipe::Unclaimed,
            stderr: Pipe::Unclaimed,
            queued: Vec::new(),
            exit: exit_tx,
        };

        Ok(Self {
            client,
            state: Mutex::new(State::Idle(Box::new(pending))),
            exit: exit_rx,
        })
    }

    pub fn client(&self) -> &Arc<Handle<ClientHandler>> {
        &self.client
    }

    fn with_pending<T>(&self, f: impl FnOnce(&mut Pending) -> Result<T>) -> Result<T> {
        match &mut *self.state.lock() {
            State::Idle(pending) => f(pending),
            _ => Err(Error::AlreadyStarted),
        }
    }

    /// Hand the channel to a driver task and wait for the start reply.
    async fn launch(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<()>>) -> Control,
    ) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let (pending, control_rx) = self.state.lock().begin(make(reply_tx))?;
            let Pending {
                channel,
                stdout,
                stderr,
                exit,
                ..
            } = *pending;

            let driver = Driver::new(stdout.into_writer(), stderr.into_writer(), exit);
            tokio::spawn(driver.run(channel, control_rx));
        }

        reply_rx.await.unwrap_or(Err(Error::ChannelClosed))
    }
}

#[async_trait]
impl RemoteSession for ChannelSession {
    type Stdin = ChannelStdin;
    type Output = DuplexStream;

    fn stdin_pipe(&self) -> Result<Self::Stdin> {
        self.with_pending(|pending| {
            if pending.stdin_claimed {
                return Err(Error::PipeTaken(Stream::Stdin));
            }
            pending.stdin_claimed = true;
            Ok(Box::pin(pending.channel.make_writer()) as ChannelStdin)
        })
    }

    fn stdout_pipe(&self) -> Result<Self::Output> {
        self.with_pending(|pending| pending.stdout.claim(Stream::Stdout))
    }

    fn stderr_pipe(&self) -> Result<Self::Output> {
        self.with_pending(|pending| pending.stderr.claim(Stream::Stderr))
    }

    async fn start(&self, command: &str) -> Result<()> {
        let command = command.to_string();
        self.launch(|reply| Control::Exec { command, reply }).await
    }

    async fn shell(&self) -> Result<()> {
        self.launch(|reply| Control::Shell { reply }).await
    }

    async fn send_request(&self, kind: &str, want_reply: bool, payload: Bytes) -> Result<()> {
        let control = request_control(kind, want_reply, &payload)?;
        self.state.lock().submit(control)
    }

    async fn wait(&self) -> ExitOutcome {
        let started = !matches!(*self.state.lock(), State::Idle(_));
        if !started {
            return ExitOutcome::Failed(Error::NotStarted);
        }

        let mut exit = self.exit.clone();
        let termination = exit
            .wait_for(Option::is_some)
            .await
            .map(|termination| termination.clone());
        match termination {
            Ok(Some(termination)) => termination.into(),
            _ => ExitOutcome::Failed(Error::ChannelClosed),
        }
    }

    async fn close(&self) -> Result<()> {
        let state = std::mem::replace(&mut *self.state.lock(), State::Closed);
        let closed = match state {
            State::Idle(pending) => pending.channel.close().await.map_err(Error::from),
            State::Running(control_tx) => {
                let _ = control_tx.send(Control::Close);
                Ok(())
            }
            State::Closed => Ok(()),
        };

        let disconnected = self
            .client
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::from);

        closed.and(disconnected)
    }
}

/// A request awaiting the server's success or failure reply.
struct Reply {
    kind: &'static str,
    tx: Option<oneshot::Sender<Result<()>>>,
}

/// Owns the channel once started and fans its messages out.
struct Driver {
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    replies: VecDeque<Reply>,
    termination: Option<Termination>,
    exit: watch::Sender<Option<Termination>>,
}

impl Driver {
    fn new(
        stdout: Option<DuplexStream>,
        stderr: Option<DuplexStream>,
        exit: watch::Sender<Option<Termination>>,
    ) -> Self {
        Self {
            stdout,
            stderr,
            replies: VecDeque::new(),
            termination: None,
            exit,
        }
    }

    async fn run(
        mut self,
        mut channel: Channel<Msg>,
        mut control: mpsc::UnboundedReceiver<Control>,
    ) {
        loop {
            tokio::select! {
                msg = channel.wait() => match msg {
                    Some(ChannelMsg::Close) | None => break,
                    Some(msg) => self.dispatch(msg).await,
                },
                Some(request) = control.recv() => self.apply(&channel, request).await,
            }
        }
        self.finish();
    }

    async fn dispatch(&mut self, msg: ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.on_data(&data).await,
            ChannelMsg::ExtendedData { data, ext } => self.on_extended_data(ext, &data).await,
            ChannelMsg::ExitStatus { exit_status } => self.on_exit_status(exit_status),
            ChannelMsg::ExitSignal {
                signal_name: signal,
                ..
            } => self.on_exit_signal(signal_name(signal)),
            ChannelMsg::Eof => self.on_eof(),
            ChannelMsg::Success => self.on_reply(true),
            ChannelMsg::Failure => self.on_reply(false),
            _ => {}
        }
    }

    async fn apply(&mut self, channel: &Channel<Msg>, request: Control) {
        match request {
            Control::Exec { command, reply } => {
                tracing::debug!(command = %command, "exec request");
                match channel.exec(true, command).await {
                    Ok(()) => self.expect_reply("exec", Some(reply)),
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            Control::Shell { reply } => match channel.request_shell(true).await {
                Ok(()) => self.expect_reply("shell", Some(reply)),
                Err(e) => {
                    let _ = reply.send(Err(e.into()));
                }
            },
            Control::Pty {
                request,
                want_reply,
            } => {
                let modes = terminal_modes(&request.modes);
                let sent = channel
                    .request_pty(
                        want_reply,
                        &request.term,
                        request.cols,
                        request.rows,
                        request.width_px,
                        request.height_px,
                        &modes,
                    )
                    .await;
                match sent {
                    Ok(()) if want_reply => self.expect_reply(PtyRequest::REQUEST_TYPE, None),
                    Ok(()) => {}
                    Err(e) => tracing::warn!(error = %e, "pty request not sent"),
                }
            }
            Control::WindowChange(change) => {
                if let Err(e) = channel
                    .window_change(change.cols, change.rows, change.width_px, change.height_px)
                    .await
                {
                    tracing::warn!(error = %e, "window change not sent");
                }
            }
            Control::Close => {
                if let Err(e) = channel.close().await {
                    tracing::debug!(error = %e, "channel close failed");
                }
            }
        }
    }

    fn expect_reply(&mut self, kind: &'static str, tx: Option<oneshot::Sender<Result<()>>>) {
        self.replies.push_back(Reply { kind, tx });
    }

    /// Replies arrive in request order.
    fn on_reply(&mut self, success: bool) {
        let Some(reply) = self.replies.pop_front() else {
            tracing::debug!(success, "unsolicited channel reply");
            return;
        };
        if !success {
            tracing::debug!(kind = reply.kind, "request rejected");
        }
        if let Some(tx) = reply.tx {
            let result = if success {
                Ok(())
            } else {
                Err(Error::Rejected(reply.kind))
            };
            let _ = tx.send(result);
        }
    }

    async fn on_data(&mut self, data: &[u8]) {
        forward(&mut self.stdout, data).await;
    }

    async fn on_extended_data(&mut self, ext: u32, data: &[u8]) {
        if ext == EXTENDED_DATA_STDERR {
            forward(&mut self.stderr, data).await;
        }
    }

    fn on_exit_status(&mut self, status: u32) {
        self.terminate(Termination::Status(status));
    }

    fn on_exit_signal(&mut self, signal: String) {
        self.terminate(Termination::Signal(signal));
    }

    /// Publish the exit as soon as it is known; output may still follow.
    fn terminate(&mut self, termination: Termination) {
        if self.termination.is_some() {
            return;
        }
        tracing::debug!(?termination, "remote process exited");
        self.termination = Some(termination.clone());
        self.exit.send_replace(Some(termination));
    }

    /// Remote output is done; readers see end of stream.
    fn on_eof(&mut self) {
        self.stdout = None;
        self.stderr = None;
    }

    fn finish(mut self) {
        self.on_eof();
        if self.termination.is_none() {
            tracing::debug!("session channel closed without an exit");
            self.exit.send_replace(Some(Termination::Lost));
        }
    }
}

/// Terminal modes russh can encode; the rest are logged and left out.
fn terminal_modes(modes: &[(u8, u32)]) -> Vec<(Pty, u32)> {
    let mut known = Vec::with_capacity(modes.len());
    for &(opcode, value) in modes {
        match Pty::from_u8(opcode) {
            Some(mode) => known.push((mode, value)),
            None => tracing::debug!(opcode, value, "terminal mode not sent"),
        }
    }
    known
}

/// Write to a pipe, dropping it once its reader is gone.
async fn forward(pipe: &mut Option<DuplexStream>, data: &[u8]) {
    let failed = match pipe {
        Some(writer) => writer.write_all(data).await.is_err(),
        None => false,
    };
    if failed {
        *pipe = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    struct Harness {
        driver: Driver,
        stdout: DuplexStream,
        stderr: DuplexStream,
        exit: watch::Receiver<Option<Termination>>,
    }

    fn harness() -> Harness {
        let mut stdout_pipe = Pipe::Unclaimed;
        let mut stderr_pipe = Pipe::Unclaimed;
        let stdout = stdout_pipe.claim(Stream::Stdout).unwrap();
        let stderr = stderr_pipe.claim(Stream::Stderr).unwrap();
        let (exit_tx, exit) = watch::channel(None);
        Harness {
            driver: Driver::new(stdout_pipe.into_writer(), stderr_pipe.into_writer(), exit_tx),
            stdout,
            stderr,
            exit,
        }
    }

    #[test]
    fn pipe_can_be_claimed_once() {
        let mut pipe = Pipe::Unclaimed;

        assert!(pipe.claim(Stream::Stdout).is_ok());
        assert!(matches!(
            pipe.claim(Stream::Stdout),
            Err(Error::PipeTaken(Stream::Stdout))
        ));
    }

    #[test]
    fn unclaimed_pipe_has_no_writer() {
        assert!(Pipe::Unclaimed.into_writer().is_none());
    }

    #[tokio::test]
    async fn data_and_stderr_reach_their_pipes() {
        let Harness {
            mut driver,
            mut stdout,
            mut stderr,
            ..
        } = harness();

        driver.on_data(b"out").await;
        driver.on_extended_data(EXTENDED_DATA_STDERR, b"err").await;
        driver.on_extended_data(7, b"ignored").await;
        driver.on_eof();

        let mut out = Vec::new();
        stdout.read_to_end(&mut out).await.unwrap();
        let mut err = Vec::new();
        stderr.read_to_end(&mut err).await.unwrap();
        assert_eq!(out, b"out");
        assert_eq!(err, b"err");
    }

    #[tokio::test]
    async fn exit_status_is_published_before_eof() {
        let Harness {
            mut driver,
            mut stdout,
            exit,
            ..
        } = harness();

        driver.on_data(b"partial").await;
        driver.on_exit_status(3);
        driver.on_eof();

        // Readers see end of stream with the status already visible to wait().
        let mut out = Vec::new();
        stdout.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"partial");
        assert_eq!(*exit.borrow(), Some(Termination::Status(3)));
        assert!(matches!(
            ExitOutcome::from(Termination::Status(3)),
            ExitOutcome::Exited(3)
        ));
    }

    #[tokio::test]
    async fn finish_keeps_the_reported_status() {
        let Harness {
            mut driver, exit, ..
        } = harness();

        driver.on_exit_status(0);
        driver.on_exit_signal("TERM".to_string());
        driver.finish();

        assert_eq!(*exit.borrow(), Some(Termination::Status(0)));
    }

    #[tokio::test]
    async fn finishing_without_status_is_lost() {
        let Harness { driver, exit, .. } = harness();

        driver.finish();

        let termination = exit.borrow().clone().unwrap();
        assert_eq!(termination, Termination::Lost);
        assert!(matches!(
            ExitOutcome::from(termination),
            ExitOutcome::Failed(Error::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn signal_maps_to_shell_status() {
        let Harness {
            mut driver, exit, ..
        } = harness();

        driver.on_exit_signal("KILL".to_string());

        let termination = exit.borrow().clone().unwrap();
        assert_eq!(termination, Termination::Signal("KILL".to_string()));
        assert!(matches!(
            ExitOutcome::from(termination),
            ExitOutcome::Exited(137)
        ));
    }

    #[test]
    fn signal_status_table() {
        assert_eq!(signal_status("HUP"), 129);
        assert_eq!(signal_status("INT"), 130);
        assert_eq!(signal_status("SEGV"), 139);
        assert_eq!(signal_status("TERM"), 143);
        assert_eq!(signal_status("WINCH"), 128);
    }

    #[test]
    fn signal_names_match_the_wire() {
        assert_eq!(signal_name(Sig::KILL), "KILL");
        assert_eq!(signal_name(Sig::Custom("WINCH".to_string())), "WINCH");
    }

    #[tokio::test]
    async fn replies_are_matched_in_request_order() {
        let Harness { mut driver, .. } = harness();
        let (exec_tx, exec_rx) = oneshot::channel();

        driver.expect_reply(PtyRequest::REQUEST_TYPE, None);
        driver.expect_reply("exec", Some(exec_tx));
        driver.on_reply(true);
        driver.on_reply(false);

        assert!(matches!(exec_rx.await.unwrap(), Err(Error::Rejected("exec"))));
        assert!(driver.replies.is_empty());
    }

    #[tokio::test]
    async fn dropped_reader_stops_forwarding() {
        let Harness {
            mut driver, stdout, ..
        } = harness();
        drop(stdout);

        driver.on_data(b"nobody listening").await;

        assert!(driver.stdout.is_none());
    }

    fn idle() -> State<()> {
        let (exit, _) = watch::channel(None);
        State::Idle(Box::new(Pending {
            channel: (),
            stdin_claimed: false,
            stdout: Pipe::Unclaimed,
            stderr: Pipe::Unclaimed,
            queued: Vec::new(),
            exit,
        }))
    }

    fn pty_control() -> Control {
        request_control(
            PtyRequest::REQUEST_TYPE,
            false,
            &PtyRequest::new("xterm", 80, 24).encode(),
        )
        .unwrap()
    }

    #[test]
    fn unknown_terminal_modes_are_left_out() {
        let modes = terminal_modes(&[(53, 1), (100, 7), (128, 38400)]);

        assert_eq!(modes.len(), 2);
        assert_eq!(modes[0], (Pty::ECHO, 1));
        assert_eq!(modes[1].1, 38400);
    }

    #[test]
    fn unknown_request_kind_is_unsupported() {
        let err = request_control("env", false, b"").err().unwrap();

        assert!(matches!(err, Error::UnsupportedRequest(ref kind) if kind == "env"));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let pty = request_control(PtyRequest::REQUEST_TYPE, false, &[0, 0]).err().unwrap();
        let window = request_control(WindowChange::REQUEST_TYPE, false, &[0, 0, 0, 80])
            .err()
            .unwrap();

        assert!(matches!(pty, Error::MalformedRequest("pty-req")));
        assert!(matches!(window, Error::MalformedRequest("window-change")));
    }

    #[test]
    fn pty_request_keeps_its_fields() {
        let control = request_control(
            PtyRequest::REQUEST_TYPE,
            true,
            &PtyRequest::new("vt100", 120, 40).mode(53, 1).encode(),
        )
        .unwrap();

        match control {
            Control::Pty {
                request,
                want_reply,
            } => {
                assert!(want_reply);
                assert_eq!(request, PtyRequest::new("vt100", 120, 40).mode(53, 1));
            }
            _ => panic!("expected a pty control"),
        }
    }

    #[tokio::test]
    async fn queued_requests_go_out_before_start() {
        let mut state = idle();
        let (reply, _reply_rx) = oneshot::channel();

        state.submit(pty_control()).unwrap();
        state
            .submit(Control::WindowChange(WindowChange::new(100, 30)))
            .unwrap();
        let (pending, mut control_rx) = state.begin(Control::Shell { reply }).unwrap();

        assert!(pending.queued.is_empty());
        assert!(matches!(control_rx.try_recv(), Ok(Control::Pty { .. })));
        assert!(matches!(
            control_rx.try_recv(),
            Ok(Control::WindowChange(change)) if change == WindowChange::new(100, 30)
        ));
        assert!(matches!(control_rx.try_recv(), Ok(Control::Shell { .. })));
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn running_requests_reach_the_driver() {
        let mut state = idle();
        let (reply, _reply_rx) = oneshot::channel();
        let (_pending, mut control_rx) = state
            .begin(Control::Exec {
                command: "true".to_string(),
                reply,
            })
            .unwrap();
        assert!(matches!(control_rx.try_recv(), Ok(Control::Exec { .. })));

        state.submit(pty_control()).unwrap();

        assert!(matches!(control_rx.try_recv(), Ok(Control::Pty { .. })));
    }

    #[tokio::test]
    async fn second_start_is_refused() {
        let mut state = idle();
        let (first, _first_rx) = oneshot::channel();
        let (second, _second_rx) = oneshot::channel();
        let _started = state.begin(Control::Shell { reply: first }).unwrap();

        let err = state.begin(Control::Shell { reply: second }).err().unwrap();

        assert!(matches!(err, Error::AlreadyStarted));
        assert!(matches!(state, State::Running(_)));
    }

    #[test]
    fn requests_after_close_are_refused() {
        let mut state: State<()> = State::Closed;

        let err = state.submit(pty_control()).err().unwrap();

        assert!(matches!(err, Error::ChannelClosed));
    }
}
