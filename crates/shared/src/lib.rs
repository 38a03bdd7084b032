//! Wire types and message contracts shared between the match server and its clients.

pub mod protocol;
pub mod types;

pub use protocol::{ClientMessage, ErrorReason, ServerMessage};
pub use types::*;
