//! Transport host for the match registry.
//!
//! - `game` - the task that owns the registry and delivers its notifications
//! - `api` - axum router: WebSocket endpoint, health and stats
//! - `scores` - where finished-game results are recorded

pub mod api;
pub mod game;
pub mod scores;
