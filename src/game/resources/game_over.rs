//! Game over state tracking and result management
//!
//! Tracks how a session ended and derives what clients are told: the winning
//! color (or none for a draw) and a human-readable reason.
//!
//! # Game Over Conditions
//!
//! ## Decisive
//! - **Checkmate**: the side to move is mated and loses
//! - **Resigned**: a participant gave up; their opponent wins
//! - **Forfeited**: a participant disconnected from an active session
//!
//! ## Draws
//! - **Stalemate**: side to move has no legal moves and is not in check
//! - **InsufficientMaterial**: neither side can mate (e.g. K vs K)
//! - **Repetition**: the same position occurred three times
//! - **FiftyMove**: fifty moves by each side without a capture or pawn move

use crate::game::types::TerminalStatus;
use shared::{Color, MatchResult};

/// Outcome of a session
///
/// Starts as `Playing` and becomes terminal exactly once per round.
///
/// ```text
/// Playing → Checkmate / Stalemate / InsufficientMaterial / Repetition / FiftyMove
///         → Resigned / Forfeited
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GameOverState {
    #[default]
    Playing,

    /// `winner` delivered mate.
    Checkmate { winner: Color },

    Stalemate,

    InsufficientMaterial,

    Repetition,

    FiftyMove,

    /// `name` resigned; `winner` is their opponent.
    Resigned { winner: Color, name: String },

    /// `name` disconnected mid-game; `winner` is their opponent.
    Forfeited { winner: Color, name: String },
}

impl GameOverState {
    /// Outcome implied by a terminal status, where `side_to_move` is the
    /// side that would move next (the mated side for checkmate).
    #[must_use]
    pub fn from_terminal(status: TerminalStatus, side_to_move: Color) -> Self {
        match status {
            TerminalStatus::None => GameOverState::Playing,
            TerminalStatus::Checkmate => GameOverState::Checkmate {
                winner: side_to_move.opposite(),
            },
            TerminalStatus::Stalemate => GameOverState::Stalemate,
            TerminalStatus::InsufficientMaterial => GameOverState::InsufficientMaterial,
            TerminalStatus::Repetition => GameOverState::Repetition,
            TerminalStatus::FiftyMove => GameOverState::FiftyMove,
        }
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        !matches!(self, GameOverState::Playing)
    }

    /// Reason string sent with `sessionOver`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            GameOverState::Playing => "Game in progress".to_string(),
            GameOverState::Checkmate { .. } => "Checkmate".to_string(),
            GameOverState::Stalemate => "Stalemate".to_string(),
            GameOverState::InsufficientMaterial => "Insufficient Material".to_string(),
            GameOverState::Repetition => "Threefold Repetition".to_string(),
            GameOverState::FiftyMove => "50-move rule".to_string(),
            GameOverState::Resigned { name, .. } => format!("{name} resigned."),
            GameOverState::Forfeited { name, .. } => format!("{name} disconnected."),
        }
    }

    /// Winning color; `None` for draws and unfinished games.
    #[must_use]
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameOverState::Checkmate { winner }
            | GameOverState::Resigned { winner, .. }
            | GameOverState::Forfeited { winner, .. } => Some(*winner),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            GameOverState::Stalemate
                | GameOverState::InsufficientMaterial
                | GameOverState::Repetition
                | GameOverState::FiftyMove
        )
    }

    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        matches!(self, GameOverState::Checkmate { .. })
    }

    /// Result from the point of view of the seat playing `color`.
    ///
    /// `None` while the game is still running.
    #[must_use]
    pub fn result_for(&self, color: Color) -> Option<MatchResult> {
        if !self.is_game_over() {
            return None;
        }
        Some(match self.winner() {
            Some(winner) if winner == color => MatchResult::Win,
            Some(_) => MatchResult::Loss,
            None => MatchResult::Draw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_over_state_default() {
        let state = GameOverState::default();
        assert_eq!(state, GameOverState::Playing);
        assert!(!state.is_game_over());
        assert_eq!(state.result_for(Color::White), None);
    }

    #[test]
    fn test_checkmate_winner_is_not_side_to_move() {
        //! After mate the mated side is the one to move
        let state = GameOverState::from_terminal(TerminalStatus::Checkmate, Color::White);
        assert_eq!(state.winner(), Some(Color::Black));
        assert!(state.is_checkmate());
        assert_eq!(state.message(), "Checkmate");
        assert_eq!(state.result_for(Color::Black), Some(MatchResult::Win));
        assert_eq!(state.result_for(Color::White), Some(MatchResult::Loss));
    }

    #[test]
    fn test_draws_have_no_winner() {
        for status in [
            TerminalStatus::Stalemate,
            TerminalStatus::InsufficientMaterial,
            TerminalStatus::Repetition,
            TerminalStatus::FiftyMove,
        ] {
            let state = GameOverState::from_terminal(status, Color::Black);
            assert!(state.is_game_over());
            assert!(state.is_draw());
            assert_eq!(state.winner(), None);
            assert_eq!(state.result_for(Color::White), Some(MatchResult::Draw));
        }
    }

    #[test]
    fn test_non_terminal_status_keeps_playing() {
        let state = GameOverState::from_terminal(TerminalStatus::None, Color::White);
        assert_eq!(state, GameOverState::Playing);
    }

    #[test]
    fn test_messages() {
        assert_eq!(GameOverState::Stalemate.message(), "Stalemate");
        assert_eq!(GameOverState::InsufficientMaterial.message(), "Insufficient Material");
        assert_eq!(GameOverState::Repetition.message(), "Threefold Repetition");
        assert_eq!(GameOverState::FiftyMove.message(), "50-move rule");
    }

    #[test]
    fn test_resignation_names_resigner() {
        let state = GameOverState::Resigned {
            winner: Color::White,
            name: "Bob".to_string(),
        };
        assert_eq!(state.message(), "Bob resigned.");
        assert_eq!(state.winner(), Some(Color::White));
        assert!(!state.is_draw());
    }

    #[test]
    fn test_forfeit_names_leaver() {
        let state = GameOverState::Forfeited {
            winner: Color::Black,
            name: "Ada".to_string(),
        };
        assert_eq!(state.message(), "Ada disconnected.");
        assert_eq!(state.result_for(Color::White), Some(MatchResult::Loss));
    }
}
