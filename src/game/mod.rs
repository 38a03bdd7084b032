//! Chess game logic, independent of any transport
//!
//! Legality and terminal detection come from the rules engine behind
//! [`rules::RulesEngine`]; everything here builds sessions on top of it.
//!
//! # Module Organization
//!
//! - `types` - board snapshot, terminal status, legal-move and move-result values
//! - `error` - [`GameError`] taxonomy shared by sessions and the registry
//! - `rules` - rules engine seam, `shakmaty` adapter and checkmate attacker scan
//! - `ai` - move selection for scripted seats
//! - `resources` - move history with undo, game-over outcome
//! - `session` - one match's lifecycle: Pending → Active → Over

pub mod ai;
pub mod error;
pub mod resources;
pub mod rules;
pub mod session;
pub mod types;

pub use error::{GameError, GameResult};
pub use session::Session;
