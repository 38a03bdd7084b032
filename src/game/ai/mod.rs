//! Scripted opponent
//!
//! Move choice runs synchronously inside the relay, right after the human's
//! move has been applied, so the scripted reply goes through the same legality
//! checks and history bookkeeping as any other move.
//!
//! - `resource`: which seat is scripted and at what difficulty
//! - `policy`: the move-selection heuristic

pub mod policy;
pub mod resource;

pub use policy::choose_move;
pub use resource::{undo_mode_for, ScriptedOpponent};
