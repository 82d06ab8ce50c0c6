// ABOUTME: SSH upstream sessions: connection setup, session channels and stdio relays.
// ABOUTME: Upstream is the entry point; RemoteSession is the seam for other transports.

mod channel;
mod client;
mod combined;
mod error;
mod prefix;
mod pty;
mod relay;
mod session;
mod upstream;

pub use channel::{ChannelSession, ChannelStdin};
pub use client::{ClientHandler, DialConfig, connect};
pub use combined::Combined;
pub use error::{Error, Result, Stream};
pub use prefix::Prefix;
pub use pty::{PtyRequest, WindowChange};
pub use relay::{BUFFER_SIZE, SharedWriter, copy_input, copy_output, first_finished};
pub use session::{ExitOutcome, RemoteSession};
pub use upstream::Upstream;
