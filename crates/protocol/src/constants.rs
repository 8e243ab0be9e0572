use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time allowed to write a WebSocket message.
pub const WS_WRITE_WAIT: Duration = Duration::from_secs(30);

/// Time to wait for a pong response (or any incoming message).
///
/// Acts as a read deadline: if nothing arrives within this window the
/// connection is considered dead and every in-flight request fails.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How often to send pings (must be well below [`WS_PONG_WAIT`]).
pub const WS_PING_PERIOD: Duration = Duration::from_secs(15);

/// Maximum message size in bytes (16 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Timeout for short request/response exchanges (handshake).
pub const WS_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum silence on a running generation or upscale job.
///
/// Every progress push resets the timer. A job that stays silent this long
/// is abandoned and reported to the caller as an empty result.
pub const JOB_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Gateway message type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // Session
    #[serde(rename = "connect")]
    Connect,
    #[serde(rename = "ready")]
    Ready,

    // Jobs
    #[serde(rename = "imagine")]
    Imagine,
    #[serde(rename = "upscale")]
    Upscale,
    #[serde(rename = "progress")]
    Progress,
    #[serde(rename = "job_result")]
    JobResult,

    #[serde(rename = "error")]
    Error,
}
