// ABOUTME: SSH-specific error types.
// ABOUTME: Covers connection setup, session pipes, process start and relay failures.

use std::fmt;
use thiserror::Error;

/// One of the three standard streams of a remote process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdin => f.write_str("stdin"),
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: no valid credentials")]
    AuthenticationFailed,

    #[error("failed to pipe {stream}")]
    Pipe {
        stream: Stream,
        #[source]
        source: Box<Error>,
    },

    #[error("{0} pipe already claimed")]
    PipeTaken(Stream),

    #[error("pipe failed to start command '{command}'")]
    Start {
        command: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to start shell")]
    Shell(#[source] Box<Error>),

    #[error("failed to collect status of command '{command}'")]
    Status {
        command: String,
        #[source]
        source: Box<Error>,
    },

    #[error("process exited with status {0}")]
    Exited(u32),

    #[error("short write")]
    ShortWrite,

    #[error("session already started")]
    AlreadyStarted,

    #[error("session not started")]
    NotStarted,

    #[error("remote rejected {0} request")]
    Rejected(&'static str),

    #[error("channel closed unexpectedly without exit status")]
    ChannelClosed,

    #[error("unsupported request type: {0}")]
    UnsupportedRequest(String),

    #[error("malformed {0} payload")]
    MalformedRequest(&'static str),

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn pipe(stream: Stream, source: Error) -> Self {
        Error::Pipe {
            stream,
            source: Box::new(source),
        }
    }

    pub(crate) fn start(command: &str, source: Error) -> Self {
        Error::Start {
            command: command.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn status(command: &str, source: Error) -> Self {
        Error::Status {
            command: command.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
