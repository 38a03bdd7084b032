//! Scripted seat configuration
//!
//! A session is played against the scripted opponent when one of its seats
//! holds a [`ParticipantKind::ScriptedAi`] participant. [`ScriptedOpponent`]
//! is that seat seen from the relay: which color it drives and how strong it
//! plays.
//!
//! # Difficulty Levels
//!
//! | Difficulty | Behaviour after mate-in-one                  |
//! |------------|----------------------------------------------|
//! | Easy       | random legal move                            |
//! | Medium     | coin flip between tactics and a random move  |
//! | Hard       | greedy material, then checks                 |

use crate::game::resources::history::UndoMode;
use shared::{AiDifficulty, Color, ParticipantKind, Seats};

/// The scripted side of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedOpponent {
    /// The color the scripted seat plays
    pub color: Color,
    pub difficulty: AiDifficulty,
}

impl ScriptedOpponent {
    /// The scripted seat that owns `to_move`, if that seat is scripted.
    #[must_use]
    pub fn on_turn(seats: &Seats, to_move: Color) -> Option<Self> {
        match seats.get(to_move)?.kind {
            ParticipantKind::ScriptedAi(difficulty) => Some(Self {
                color: to_move,
                difficulty,
            }),
            ParticipantKind::Human => None,
        }
    }

    /// Short human-readable description, used in logs.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self.difficulty {
            AiDifficulty::Easy => "Easy (random)",
            AiDifficulty::Medium => "Medium (opportunistic)",
            AiDifficulty::Hard => "Hard (greedy)",
        }
    }
}

/// Undo granularity for a seat layout.
///
/// Against a scripted seat an undo takes back a full turn so the human
/// lands on their own move again.
#[must_use]
pub fn undo_mode_for(seats: &Seats) -> UndoMode {
    let scripted = [Color::White, Color::Black]
        .into_iter()
        .any(|c| seats.get(c).is_some_and(|p| p.is_scripted()));
    if scripted {
        UndoMode::FullTurn
    } else {
        UndoMode::HalfTurn
    }
}
