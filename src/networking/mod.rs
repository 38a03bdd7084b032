//! Networking module - session registry and move relay
//!
//! Transport-agnostic: handlers take a [`ConnectionId`](shared::ConnectionId)
//! and a [`ClientMessage`](shared::ClientMessage), and leave their replies in
//! an [`Outbox`] for the host to deliver.
//!
//! # Module Structure
//!
//! - `registry` - sessions, codes, matchmaking queue, disconnects, grace sweep
//! - `relay` - move submission, scripted replies, undo and new rounds
//! - `outbox` - addressed notifications and score-update events

pub mod outbox;
pub mod registry;
pub mod relay;

pub use outbox::{Envelope, Outbox, ScoreUpdate};
pub use registry::{MatchRegistry, QueueEntry};
