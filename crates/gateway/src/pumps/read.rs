//! WebSocket read pump: routes incoming messages to waiting requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use imagine_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};
use imagine_protocol::envelope::Message;
use imagine_protocol::messages::ProgressNotice;

use crate::pumps::ping::ping_seq;
use crate::ws_client::PendingMap;

/// Reads messages from the WebSocket and dispatches them.
///
/// Any incoming frame resets the pong deadline; if nothing arrives within
/// [`WS_PONG_WAIT`] the connection is considered dead. On exit every
/// in-flight request is failed by dropping its reply sender, and the
/// client is marked closed.
pub(crate) async fn read_pump<S>(
    mut read: S,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let pong_deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut pong_deadline => {
                warn!("pong timeout, connection dead");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        let deadline = tokio::time::Instant::now() + WS_PONG_WAIT;
                        pong_deadline.as_mut().reset(deadline);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_text_message(&text, &pending).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(data) => {
                                trace!(seq = ?ping_seq(&data), "received pong");
                            }
                            tungstenite::Message::Close(frame) => {
                                debug!(?frame, "received close frame");
                                break;
                            }
                            _ => {} // Binary is unused
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    let mut map = pending.lock().await;
    closed.store(true, Ordering::Release);
    if !map.is_empty() {
        warn!(
            in_flight = map.len(),
            "gateway connection lost with requests in flight"
        );
    }
    map.clear();
    drop(map);
    cancel.cancel();
}

/// Handles a text message from the WebSocket.
async fn handle_text_message(text: &str, pending: &PendingMap) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("message too large ({} bytes), dropping", text.len());
        return;
    }

    let msg: Message = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!("failed to parse message: {e}");
            return;
        }
    };

    trace!(msg_type = ?msg.msg_type, id = %msg.id, "received message");

    let mut map = pending.lock().await;

    // Progress pushes leave the request pending.
    if msg.is_progress() {
        let Some(sink) = map.get(&msg.id).and_then(|req| req.progress.as_ref()) else {
            debug!(id = %msg.id, "progress for unknown job, dropping");
            return;
        };
        match msg.parse_payload::<ProgressNotice>() {
            Ok(Some(notice)) => {
                let _ = sink.send(notice);
            }
            Ok(None) => trace!(id = %msg.id, "empty progress push"),
            Err(e) => warn!(id = %msg.id, "malformed progress payload: {e}"),
        }
        return;
    }

    if let Some(req) = map.remove(&msg.id) {
        let _ = req.reply.send(msg);
        return;
    }
    drop(map);

    warn!(msg_type = ?msg.msg_type, id = %msg.id, "unsolicited message, dropping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_client::PendingRequest;
    use futures_util::stream;
    use imagine_protocol::constants::MessageType;
    use std::collections::HashMap;
    use tokio::sync::{Mutex, oneshot};

    fn empty_pending() -> PendingMap {
        Arc::new(Mutex::new(HashMap::new()))
    }

    async fn register_job(
        pending: &PendingMap,
        id: &str,
    ) -> (oneshot::Receiver<Message>, mpsc::UnboundedReceiver<ProgressNotice>) {
        let (reply, reply_rx) = oneshot::channel();
        let (progress, progress_rx) = mpsc::unbounded_channel();
        pending.lock().await.insert(
            id.to_string(),
            PendingRequest {
                reply,
                progress: Some(progress),
            },
        );
        (reply_rx, progress_rx)
    }

    fn encode<T: serde::Serialize>(id: &str, msg_type: MessageType, payload: Option<&T>) -> String {
        serde_json::to_string(&Message::new(id, msg_type, payload).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn handle_text_routes_response_to_pending() {
        let pending = empty_pending();
        let (reply_rx, _progress_rx) = register_job(&pending, "req-1").await;

        let json = encode::<()>("req-1", MessageType::Ready, None);
        handle_text_message(&json, &pending).await;

        let resp = reply_rx.await.unwrap();
        assert_eq!(resp.id, "req-1");
        assert_eq!(resp.msg_type, MessageType::Ready);
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn handle_text_forwards_progress_and_keeps_request() {
        let pending = empty_pending();
        let (_reply_rx, mut progress_rx) = register_job(&pending, "job-1").await;

        let notice = ProgressNotice {
            uri: "https://cdn.example.com/partial.webp".into(),
            progress: "46%".into(),
        };
        let json = encode("job-1", MessageType::Progress, Some(&notice));
        handle_text_message(&json, &pending).await;

        assert_eq!(progress_rx.try_recv().unwrap(), notice);
        assert!(pending.lock().await.contains_key("job-1"));
    }

    #[tokio::test]
    async fn handle_text_drops_progress_for_unknown_job() {
        let pending = empty_pending();
        let (_reply_rx, mut progress_rx) = register_job(&pending, "job-1").await;

        let notice = ProgressNotice {
            uri: String::new(),
            progress: "1%".into(),
        };
        let json = encode("other", MessageType::Progress, Some(&notice));
        handle_text_message(&json, &pending).await;

        assert!(progress_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn handle_text_routes_error_envelope_as_reply() {
        let pending = empty_pending();
        let (reply_rx, _progress_rx) = register_job(&pending, "job-2").await;

        let json = serde_json::to_string(&Message::error("job-2", 429, "queue full")).unwrap();
        handle_text_message(&json, &pending).await;

        let resp = reply_rx.await.unwrap();
        assert_eq!(resp.error.unwrap().code, 429);
    }

    #[tokio::test]
    async fn handle_text_ignores_malformed_json() {
        let pending = empty_pending();
        handle_text_message("not valid json {{{", &pending).await;
    }

    #[tokio::test]
    async fn handle_text_rejects_oversized_message() {
        let pending = empty_pending();
        let huge = "x".repeat(WS_MAX_MESSAGE_SIZE + 1);
        handle_text_message(&huge, &pending).await;
    }

    #[tokio::test]
    async fn read_pump_fails_in_flight_requests_on_stream_end() {
        let pending = empty_pending();
        let (reply_rx, _progress_rx) = register_job(&pending, "job-1").await;
        let closed = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();
        let (write_tx, _write_rx) = mpsc::channel(16);
        let empty = stream::empty::<Result<tungstenite::Message, tungstenite::Error>>();

        read_pump(empty, pending.clone(), closed.clone(), write_tx, cancel.clone()).await;

        assert!(reply_rx.await.is_err(), "waiter should see the drop");
        assert!(pending.lock().await.is_empty());
        assert!(closed.load(Ordering::Acquire));
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn read_pump_answers_ping_with_pong() {
        let pending = empty_pending();
        let (write_tx, mut write_rx) = mpsc::channel(16);
        let frames = stream::iter(vec![Ok(tungstenite::Message::Ping(vec![7u8].into()))]);

        read_pump(
            frames,
            pending,
            Arc::new(AtomicBool::new(false)),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        match write_rx.recv().await {
            Some(tungstenite::Message::Pong(data)) => assert_eq!(&data[..], &[7u8]),
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_pump_timeout_on_silence() {
        tokio::time::pause();

        let closed = Arc::new(AtomicBool::new(false));
        let (write_tx, _write_rx) = mpsc::channel(16);
        let silent = stream::pending::<Result<tungstenite::Message, tungstenite::Error>>();

        let start = tokio::time::Instant::now();
        read_pump(
            silent,
            empty_pending(),
            closed.clone(),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        assert!(start.elapsed() >= WS_PONG_WAIT);
        assert!(closed.load(Ordering::Acquire), "should close on pong timeout");
    }

    #[tokio::test]
    async fn read_pump_resets_deadline_on_any_message() {
        tokio::time::pause();

        let closed = Arc::new(AtomicBool::new(false));
        let (write_tx, _write_rx) = mpsc::channel(16);

        // One text frame just before the first deadline, then silence.
        let wait_before_msg = WS_PONG_WAIT - std::time::Duration::from_secs(1);
        let json = encode::<()>("msg-1", MessageType::Ready, None);
        let text_msg: Result<tungstenite::Message, tungstenite::Error> =
            Ok(tungstenite::Message::Text(json.into()));
        let delayed = stream::once(async move {
            tokio::time::sleep(wait_before_msg).await;
            text_msg
        });
        let combined = Box::pin(delayed.chain(stream::pending()));

        let start = tokio::time::Instant::now();
        read_pump(
            combined,
            empty_pending(),
            closed.clone(),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        assert!(start.elapsed() >= wait_before_msg + WS_PONG_WAIT);
        assert!(closed.load(Ordering::Acquire));
    }
}
