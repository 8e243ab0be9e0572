use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// First message on a new connection. Carries the remote service
/// credentials the gateway uses on the client's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub server_id: String,
    pub channel_id: String,
    pub token: String,
    pub client_name: String,
    pub version: String,
}

/// Gateway acknowledgement of a [`ConnectRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub session_id: String,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Submits a text prompt for generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagineRequest {
    pub prompt: String,
}

/// Requests a higher-resolution rendering of one candidate of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleRequest {
    /// 1-based candidate index within the job's grid.
    pub index: u8,
    pub msg_id: String,
    pub hash: String,
    pub flags: u32,
}

/// Interim progress push for a running job.
///
/// Shares the `id` of the request that started the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressNotice {
    pub uri: String,
    pub progress: String,
}

/// Terminal result of an imagine or upscale job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub id: String,
    /// Absent when the service has nothing to show yet.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default)]
    pub flags: u32,
}
