//! Gateway client for remote image generation.
//!
//! Holds one WebSocket session to the gateway that fronts the generation
//! service and implements the pipeline's generate and upscale
//! capabilities on top of it.

mod capability;
mod pumps;
pub mod types;
pub mod ws_client;

pub use types::{Credentials, GatewayConfig};
pub use ws_client::{GatewayClient, GatewayError};
