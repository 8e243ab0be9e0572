//! Generation pipeline: prompt in, upscaled asset on disk out.
//!
//! This crate holds the business logic and no transport code. The
//! gateway crate implements the remote capabilities and the asset client
//! crate implements the HTTP [`Transport`].
//!
//! # Flow
//!
//! 1. **Generate**: submit the prompt, repeating while the result is empty
//! 2. **Upscale**: upscale one candidate of the generated grid, same policy
//! 3. **Fetch**: download the upscaled asset to `{dest}/{prefix-}{NNN}.png`

pub mod capability;
pub mod error;
pub mod fetch;
pub mod path;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod types;

pub use capability::{CapabilityFuture, GenerateCapability, UpscaleCapability};
pub use error::{CapabilityError, FetchError, PipelineError};
pub use fetch::{AssetFetcher, RetryingTransport, Transport, TransportFuture};
pub use path::{ensure_output_dir, format_output_path, pad_sequence};
pub use pipeline::{CANDIDATE_COUNT, DEFAULT_CANDIDATE_INDEX, GenerationPipeline};
pub use progress::{
    ChannelReporter, LogReporter, PipelineEvent, ProgressHandle, ProgressReporter, SilentReporter,
};
pub use retry::RetryPolicy;
pub use types::{GenerationResult, Phase, PhaseState, ProgressEvent, UpscaleJob, UpscaleResult};
