//! Wire protocol for the imagine generation gateway.
//!
//! Every frame is a JSON [`Message`] envelope. Requests and their terminal
//! responses share an `id`; progress pushes reuse the id of the job that
//! produced them.

pub mod constants;
pub mod envelope;
pub mod messages;

pub use constants::MessageType;
pub use envelope::{Message, RemoteError};
pub use messages::{
    ConnectRequest, ImagineRequest, JobResult, ProgressNotice, ReadyResponse, UpscaleRequest,
};
