//! WebSocket write pump: serialises outbound messages.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::error;

use imagine_protocol::constants::WS_WRITE_WAIT;

/// Writes queued messages to the WebSocket.
///
/// A write that does not complete within [`WS_WRITE_WAIT`] ends the pump.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                let Some(m) = msg else { break };
                match tokio::time::timeout(WS_WRITE_WAIT, write.send(m)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!("WebSocket write error: {e}");
                        break;
                    }
                    Err(_) => {
                        error!("WebSocket write timed out after {WS_WRITE_WAIT:?}");
                        break;
                    }
                }
            }
        }
    }

    let close = write.send(tungstenite::Message::Close(None));
    let _ = tokio::time::timeout(WS_WRITE_WAIT, close).await;
}
