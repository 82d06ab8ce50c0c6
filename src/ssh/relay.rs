// ABOUTME: Stream relay building blocks for upstream sessions.
// ABOUTME: First-finisher race over detached tasks and the prefix-injecting output copy.

use super::error::{Error, Result};
use super::prefix::Prefix;
use super::session::ExitOutcome;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};

/// Size of the output copy buffer. A prefix only fits after a chunk that
/// leaves enough room for it.
pub const BUFFER_SIZE: usize = 16 * 1024;

/// Write half of a caller channel, shared by the stdout and stderr copies.
pub type SharedWriter<W> = Arc<Mutex<W>>;

/// Run every unit on its own task and return the first outcome reported.
///
/// The result channel holds one slot per unit, so no unit ever blocks on
/// reporting. Units still running when the first one reports are detached:
/// they are neither joined nor cancelled and their outcomes are dropped.
/// They stop once their streams fail, typically when the session closes.
pub async fn first_finished(units: Vec<BoxFuture<'static, ExitOutcome>>) -> ExitOutcome {
    let (tx, mut rx) = mpsc::channel(units.len().max(1));
    for unit in units {
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(unit.await).await;
        });
    }
    drop(tx);

    rx.recv()
        .await
        .unwrap_or(ExitOutcome::Failed(Error::ChannelClosed))
}

/// Copy the caller's input into the remote stdin until either side ends.
pub async fn copy_input<R, W>(mut src: R, mut dst: W) -> ExitOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match tokio::io::copy(&mut src, &mut dst).await {
        Ok(n) => {
            tracing::debug!(bytes = n, "input relay reached end of stream");
            ExitOutcome::Clean
        }
        Err(e) => ExitOutcome::Failed(e.into()),
    }
}

/// Copy remote output into the caller's channel, one chunk per write.
///
/// After every read the current prefix, if any, is appended to the chunk
/// when both fit in the buffer; otherwise the chunk goes out alone. A
/// write that accepts fewer bytes than offered ends the copy with
/// [`Error::ShortWrite`]. End of stream finishes cleanly.
pub async fn copy_output<R, W>(
    src: R,
    dst: SharedWriter<W>,
    prefix: Option<Arc<Prefix>>,
) -> ExitOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = pump(src, &dst, prefix.as_deref()).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "output relay failed");
    }
    result.into()
}

async fn pump<R, W>(mut src: R, dst: &Mutex<W>, prefix: Option<&Prefix>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let n = src.read(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }

        let mut len = n;
        if let Some(extra) = prefix.and_then(Prefix::get) {
            if n + extra.len() <= BUFFER_SIZE {
                buffer[n..n + extra.len()].copy_from_slice(&extra);
                len += extra.len();
            }
        }

        let mut writer = dst.lock().await;
        let written = writer.write(&buffer[..len]).await?;
        if written != len {
            return Err(Error::ShortWrite);
        }
        writer.flush().await?;
    }
}
