//! Pipeline error types.

use std::path::PathBuf;

use crate::types::Phase;

/// Unrecoverable failure reported by a remote capability.
///
/// An empty result is not an error; capabilities report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("connection lost: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("rejected by remote service: {0}")]
    Rejected(String),
}

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{phase} failed: {source}")]
    Capability {
        phase: Phase,
        #[source]
        source: CapabilityError,
    },

    #[error("{phase} returned no result after {attempts} attempts")]
    RetryExhausted { phase: Phase, attempts: u32 },
}

/// Errors from retrieving or persisting the final asset.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP status {status} for {uri}")]
    Status { status: u16, uri: String },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}
