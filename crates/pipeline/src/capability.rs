//! Remote capabilities the pipeline drives.
//!
//! The gateway client implements these on top of its WebSocket session.
//! Keeping them as traits decouples the retry and sequencing logic from
//! the transport and lets tests substitute recording stubs.

use std::future::Future;
use std::pin::Pin;

use crate::error::CapabilityError;
use crate::progress::ProgressHandle;
use crate::types::{GenerationResult, UpscaleJob, UpscaleResult};

/// Future returned by a capability call. `Ok(None)` is an empty result.
pub type CapabilityFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<Option<T>, CapabilityError>> + Send + 'a>>;

/// Submits a text prompt and waits for the generated grid.
pub trait GenerateCapability: Send + Sync {
    fn imagine<'a>(
        &'a self,
        prompt: &'a str,
        progress: &'a ProgressHandle<'a>,
    ) -> CapabilityFuture<'a, GenerationResult>;
}

/// Requests a higher-resolution rendering of one generated candidate.
pub trait UpscaleCapability: Send + Sync {
    fn upscale<'a>(
        &'a self,
        job: &'a UpscaleJob,
        progress: &'a ProgressHandle<'a>,
    ) -> CapabilityFuture<'a, UpscaleResult>;
}
