use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::{RawValue, to_raw_value};

use crate::constants::MessageType;

/// Failure reported by the gateway or the remote service behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Envelope for all gateway traffic.
///
/// Requests, progress pushes and the terminal reply of a job share one `id`.
/// The payload stays raw until the receiver knows what `type` it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl Message {
    pub fn new<T: Serialize>(
        id: impl Into<String>,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: id.into(),
            msg_type,
            payload: payload.map(to_raw_value).transpose()?,
            error: None,
        })
    }

    /// Interim progress for a running job. Never completes the request.
    pub fn is_progress(&self) -> bool {
        self.msg_type == MessageType::Progress && self.error.is_none()
    }

    /// Decodes the payload as `T`.
    ///
    /// The gateway sends `null` or no payload at all for a job that produced
    /// nothing; both yield `Ok(None)`.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        let Some(raw) = self.payload.as_deref() else {
            return Ok(None);
        };
        if raw.get().trim() == "null" {
            return Ok(None);
        }
        serde_json::from_str(raw.get()).map(Some)
    }

    pub fn error(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            msg_type: MessageType::Error,
            payload: None,
            error: Some(RemoteError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Answers this message under the same id.
    pub fn reply<T: Serialize>(
        &self,
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        Message::new(&self.id, msg_type, payload)
    }

    pub fn reply_error(&self, code: i32, message: impl Into<String>) -> Self {
        Message::error(&self.id, code, message)
    }
}
