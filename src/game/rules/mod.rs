//! Rules engine seam
//!
//! Move legality, move application and terminal detection are owned by an
//! external rules engine. The orchestration layer only talks to it through
//! [`RulesEngine`]; positions are opaque values that are replaced, never
//! mutated in place.
//!
//! # Module Structure
//!
//! - `engine` - [`ShakmatyRules`], the adapter over the `shakmaty` crate
//! - `attackers` - geometric attacker scan used to highlight a mated king

pub mod attackers;
pub mod engine;

#[cfg(test)]
mod tests;

use crate::game::error::GameResult;
use crate::game::types::{BoardSnapshot, LegalMove, MoveResult, TerminalStatus};
use shared::{Color, Move, Square};

pub use attackers::{attackers_of, checkmate_highlight};
pub use engine::{ChessPosition, ShakmatyRules};

/// Capability set the core consumes from a rules engine.
pub trait RulesEngine {
    /// Full game state: placement, side to move, castling/en-passant and
    /// repetition bookkeeping.
    type Position: Clone + std::fmt::Debug + Send + 'static;

    fn initial_position(&self) -> Self::Position;

    /// Legal moves in `position`, optionally restricted to those leaving `from`.
    fn legal_moves(&self, position: &Self::Position, from: Option<Square>) -> Vec<LegalMove>;

    /// Applies `mv`, returning the new position. Fails with
    /// [`GameError::IllegalMove`](crate::game::error::GameError::IllegalMove)
    /// without touching `position`.
    fn apply_move(
        &self,
        position: &Self::Position,
        mv: &Move,
    ) -> GameResult<MoveResult<Self::Position>>;

    fn terminal_status(&self, position: &Self::Position) -> TerminalStatus;

    fn board_snapshot(&self, position: &Self::Position) -> BoardSnapshot;

    /// Side to move.
    fn turn_of(&self, position: &Self::Position) -> Color;

    /// Whether the side to move is in check.
    fn in_check(&self, position: &Self::Position) -> bool;

    /// Wire encoding of a position (FEN).
    fn encode(&self, position: &Self::Position) -> String;
}
