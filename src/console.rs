//! The console writer: drains the guest's output port onto a sink.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Writes each output event verbatim, followed by a blank line, in
/// emission order. Runs until the port closes, then flushes.
///
/// Output is fire-and-forget for the guest, so a sink error ends the task
/// without reporting anything back; it is logged and the remaining events
/// are dropped.
pub(crate) async fn run<W>(mut rx: mpsc::Receiver<String>, mut sink: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(text) = rx.recv().await {
        debug!("console: {text}");
        if let Err(e) = sink.write_all(format!("{text}\n\n").as_bytes()).await {
            error!("console write failed: {e}");
            return;
        }
    }
    if let Err(e) = sink.flush().await {
        error!("console flush failed: {e}");
    }
}
