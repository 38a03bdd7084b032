//! Match orchestration and game-state reconciliation for two-player chess.
//!
//! - [`core`] - configuration
//! - [`game`] - rules adapter, sessions, history and the scripted opponent
//! - [`networking`] - session registry, matchmaking and move relay

pub mod core;
pub mod game;
pub mod networking;
