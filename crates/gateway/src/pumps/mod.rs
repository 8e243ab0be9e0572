//! Background tasks that own the WebSocket halves.

pub(crate) mod ping;
pub(crate) mod read;
pub(crate) mod write;
