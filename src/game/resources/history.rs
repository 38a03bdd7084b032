//! Move history and undo-by-replay
//!
//! Keeps the ordered list of moves applied in the current round. The list is
//! only ever appended to, truncated from the end by an undo, or cleared by a
//! new round; the session position is always what you get by replaying it
//! from the round's initial position.
//!
//! Undo never asks the rules engine to take a move back. It drops the last
//! one or two records and replays what remains:
//!
//! ```text
//! initial ──e4──► p1 ──e5──► p2 ──Nf3──► p3        undo(HalfTurn)
//! initial ──e4──► p1 ──e5──► p2                    ◄── replayed prefix
//! ```

use crate::game::error::GameResult;
use crate::game::rules::RulesEngine;
use shared::MoveRecord;

/// How far an undo reaches back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoMode {
    /// One ply. Both seats are human.
    HalfTurn,
    /// Two plies, so a human playing a scripted seat is back on their own move.
    FullTurn,
}

impl UndoMode {
    #[must_use]
    pub const fn plies(self) -> usize {
        match self {
            UndoMode::HalfTurn => 1,
            UndoMode::FullTurn => 2,
        }
    }
}

/// Ordered record of applied moves for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    /// Index 0 is White's first move, index 1 Black's reply, and so on.
    moves: Vec<MoveRecord>,
}

impl MoveHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_move(&mut self, record: MoveRecord) {
        self.moves.push(record);
    }

    /// The most recent move, if any.
    #[must_use]
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.moves.last()
    }

    #[must_use]
    pub fn get_move(&self, index: usize) -> Option<&MoveRecord> {
        self.moves.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveRecord> {
        self.moves.iter()
    }

    /// Snapshot of every record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<MoveRecord> {
        self.moves.clone()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Drops up to `mode.plies()` records from the end and returns how many
    /// were removed. Zero means there was nothing to undo.
    pub fn undo(&mut self, mode: UndoMode) -> usize {
        let k = mode.plies().min(self.moves.len());
        self.moves.truncate(self.moves.len() - k);
        k
    }

    /// Rebuilds the position reached by playing every record from `initial`.
    pub fn replay<R: RulesEngine>(&self, rules: &R, initial: &R::Position) -> GameResult<R::Position> {
        let mut position = initial.clone();
        for record in &self.moves {
            position = rules.apply_move(&position, &record.as_move())?.position;
        }
        Ok(position)
    }
}
