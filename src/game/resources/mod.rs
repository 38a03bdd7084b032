//! Per-session game state
//!
//! ## Game History
//! - [`MoveHistory`] - ordered move records, basis for undo and move lists
//! - [`UndoMode`] - half-turn or full-turn undo
//!
//! ## Game Status
//! - [`GameOverState`] - win/loss/draw outcome and its reason text

pub mod game_over;
pub mod history;

pub use game_over::GameOverState;
pub use history::{MoveHistory, UndoMode};
