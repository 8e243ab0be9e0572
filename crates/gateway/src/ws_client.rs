//! WebSocket client for the generation gateway.
//!
//! Implements request-response with UUID correlation, long-running jobs
//! that stream progress under their request id, and ping/pong keepalive.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tracing::{debug, info, warn};

use imagine_pipeline::ProgressHandle;
use imagine_protocol::constants::{
    JOB_IDLE_TIMEOUT, MessageType, WS_MAX_MESSAGE_SIZE, WS_REQUEST_TIMEOUT,
};
use imagine_protocol::envelope::Message;
use imagine_protocol::messages::{ConnectRequest, JobResult, ProgressNotice, ReadyResponse};

use crate::types::GatewayConfig;

/// Errors from the gateway client.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("gateway error {code}: {message}")]
    Rejected { code: i32, message: String },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("unexpected message: {0}")]
    Protocol(String),
}

/// An in-flight request awaiting its final message.
pub(crate) struct PendingRequest {
    pub(crate) reply: oneshot::Sender<Message>,
    /// Present for jobs; receives progress pushes sharing the request id.
    pub(crate) progress: Option<mpsc::UnboundedSender<ProgressNotice>>,
}

pub(crate) type PendingMap = Arc<Mutex<HashMap<String, PendingRequest>>>;

/// WebSocket session with the gateway.
///
/// Returned from [`GatewayClient::connect`] only after the gateway accepted
/// the credentials.
pub struct GatewayClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    pending: PendingMap,
    /// Set by the read pump, under the pending lock, when the connection is gone.
    closed: Arc<AtomicBool>,
    session_id: String,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
    cancel: tokio_util::sync::CancellationToken,
}

impl GatewayClient {
    /// Connects to the gateway and performs the session handshake.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut ws_config = tokio_tungstenite::tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(&config.url, Some(ws_config), false)
                .await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let cancel = tokio_util::sync::CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let pending = pending.clone();
            let closed = closed.clone();
            let cancel = cancel.clone();
            let write_tx = write_tx.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read, pending, closed, write_tx, cancel,
            ))
        };

        let ping_handle = {
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::ping::ping_pump(write_tx, cancel))
        };

        let mut client = Self {
            write_tx,
            pending,
            closed,
            session_id: String::new(),
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
            cancel,
        };

        let ready = client.handshake(&config.connect_request()).await?;
        info!(session = %ready.session_id, url = %config.url, "connected to gateway");
        client.session_id = ready.session_id;
        Ok(client)
    }

    async fn handshake(&self, request: &ConnectRequest) -> Result<ReadyResponse, GatewayError> {
        let resp = match self.send_request(MessageType::Connect, Some(request)).await {
            Ok(resp) => resp,
            Err(GatewayError::Rejected { code, message }) => {
                return Err(GatewayError::Handshake(format!(
                    "rejected ({code}): {message}"
                )));
            }
            Err(e) => return Err(e),
        };

        if resp.msg_type != MessageType::Ready {
            return Err(GatewayError::Handshake(format!(
                "expected ready, got {:?}",
                resp.msg_type
            )));
        }
        resp.parse_payload::<ReadyResponse>()?
            .ok_or_else(|| GatewayError::Handshake("ready without session".into()))
    }

    /// Session id assigned by the gateway.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Sends a request and waits for the response.
    pub async fn send_request<T: Serialize + Sync>(
        &self,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Message, GatewayError> {
        let id = uuid::Uuid::new_v4().to_string();
        let msg = Message::new(&id, msg_type, payload)?;
        let json = serde_json::to_string(&msg)?;

        let (tx, rx) = oneshot::channel();
        self.register(
            &id,
            PendingRequest {
                reply: tx,
                progress: None,
            },
        )
        .await?;
        self.send_text(&id, json).await?;

        let result = tokio::time::timeout(WS_REQUEST_TIMEOUT, rx).await;

        // Clean up pending entry on any exit path.
        self.pending.lock().await.remove(&id);

        match result {
            Ok(Ok(resp)) => {
                if let Some(err) = &resp.error {
                    return Err(GatewayError::Rejected {
                        code: err.code,
                        message: err.message.clone(),
                    });
                }
                Ok(resp)
            }
            Ok(Err(_)) => Err(GatewayError::Closed),
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    /// Submits a job and waits for its result, forwarding progress pushes.
    ///
    /// Returns `Ok(None)` when the job produced nothing: a `job_result`
    /// without payload, an error envelope, or [`JOB_IDLE_TIMEOUT`] without
    /// any message for the job. Connection loss is an error.
    pub async fn run_job<T: Serialize + Sync>(
        &self,
        msg_type: MessageType,
        payload: &T,
        progress: &ProgressHandle<'_>,
    ) -> Result<Option<JobResult>, GatewayError> {
        let id = uuid::Uuid::new_v4().to_string();
        let msg = Message::new(&id, msg_type.clone(), Some(payload))?;
        let json = serde_json::to_string(&msg)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        self.register(
            &id,
            PendingRequest {
                reply: reply_tx,
                progress: Some(progress_tx),
            },
        )
        .await?;
        self.send_text(&id, json).await?;
        debug!(id = %id, msg_type = ?msg_type, "job submitted");

        let outcome = await_job(reply_rx, progress_rx, progress).await;
        self.pending.lock().await.remove(&id);
        outcome
    }

    async fn register(&self, id: &str, request: PendingRequest) -> Result<(), GatewayError> {
        let mut map = self.pending.lock().await;
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::Closed);
        }
        map.insert(id.to_string(), request);
        Ok(())
    }

    async fn send_text(&self, id: &str, json: String) -> Result<(), GatewayError> {
        if self
            .write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .is_err()
        {
            self.pending.lock().await.remove(id);
            return Err(GatewayError::Closed);
        }
        Ok(())
    }

    /// Gracefully closes the connection.
    pub async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}

/// Waits for a job's final message while relaying its progress.
///
/// Every progress push restarts the [`JOB_IDLE_TIMEOUT`] timer.
pub(crate) async fn await_job(
    mut reply_rx: oneshot::Receiver<Message>,
    mut progress_rx: mpsc::UnboundedReceiver<ProgressNotice>,
    progress: &ProgressHandle<'_>,
) -> Result<Option<JobResult>, GatewayError> {
    let idle = tokio::time::sleep(JOB_IDLE_TIMEOUT);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            biased;

            Some(notice) = progress_rx.recv() => {
                idle.as_mut().reset(tokio::time::Instant::now() + JOB_IDLE_TIMEOUT);
                progress.report(&notice.uri, &notice.progress);
            }

            reply = &mut reply_rx => {
                let msg = reply.map_err(|_| GatewayError::Closed)?;
                while let Ok(notice) = progress_rx.try_recv() {
                    progress.report(&notice.uri, &notice.progress);
                }
                return job_outcome(msg);
            }

            () = &mut idle => {
                warn!(
                    phase = %progress.phase(),
                    timeout_secs = JOB_IDLE_TIMEOUT.as_secs(),
                    "job went silent, treating as empty"
                );
                return Ok(None);
            }
        }
    }
}

fn job_outcome(msg: Message) -> Result<Option<JobResult>, GatewayError> {
    if let Some(err) = &msg.error {
        warn!(error = %err, "job failed remotely, treating as empty");
        return Ok(None);
    }
    if msg.msg_type != MessageType::JobResult {
        return Err(GatewayError::Protocol(format!(
            "expected job_result, got {:?}",
            msg.msg_type
        )));
    }
    Ok(msg.parse_payload::<JobResult>()?)
}
