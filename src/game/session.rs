//! Session state machine
//!
//! One match between two seats, from creation to termination:
//!
//! ```text
//! Pending ──second seat filled──► Active ──terminal status / resign / forfeit──► Over
//!                                   ▲                                           │
//!                                   └──────────────── new round ────────────────┘
//! ```
//!
//! `Over` is sticky for moves and undo; only a new round leaves it. Every
//! check runs before any mutation, so a rejected request leaves the session
//! exactly as it was.

use std::time::Instant;

use tracing::info;

use crate::game::error::{GameError, GameResult};
use crate::game::resources::{GameOverState, MoveHistory, UndoMode};
use crate::game::rules::{checkmate_highlight, ChessPosition, RulesEngine};
use shared::{
    CheckmateHighlight, Color, ConnectionId, MatchResult, Move, MoveRecord, Participant, Seats,
    SessionId, SessionStatus,
};

/// A match and its authoritative state.
///
/// `P` is the rules engine's position type.
#[derive(Debug, Clone)]
pub struct Session<P = ChessPosition> {
    pub id: SessionId,
    pub seats: Seats,
    initial: P,
    position: P,
    history: MoveHistory,
    status: SessionStatus,
    outcome: GameOverState,
    over_since: Option<Instant>,
}

impl<P: Clone> Session<P> {
    /// A session waiting for its second participant.
    pub fn new_pending(id: SessionId, color: Color, creator: Participant, initial: P) -> Self {
        let mut seats = Seats::default();
        *seats.slot_mut(color) = Some(creator);
        Self::with_status(id, seats, initial, SessionStatus::Pending)
    }

    /// A session with both seats filled, accepting moves immediately.
    pub fn new_active(id: SessionId, seats: Seats, initial: P) -> Self {
        Self::with_status(id, seats, initial, SessionStatus::Active)
    }

    fn with_status(id: SessionId, seats: Seats, initial: P, status: SessionStatus) -> Self {
        Self {
            id,
            seats,
            position: initial.clone(),
            initial,
            history: MoveHistory::new(),
            status,
            outcome: GameOverState::Playing,
            over_since: None,
        }
    }

    #[must_use]
    pub fn position(&self) -> &P {
        &self.position
    }

    #[must_use]
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn outcome(&self) -> &GameOverState {
        &self.outcome
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    /// When the session went Over, for the grace-window sweep.
    #[must_use]
    pub fn over_since(&self) -> Option<Instant> {
        self.over_since
    }

    #[must_use]
    pub fn holds_seat(&self, connection: ConnectionId) -> bool {
        self.seats.colors_of(connection).next().is_some()
    }

    /// Two distinct remote connections share the board.
    fn is_remote_pair(&self) -> bool {
        self.seats.connections().len() == 2
    }

    /// Seats `participant` opposite whoever is already seated and returns
    /// their color. Filling the second seat starts the game.
    pub fn fill_empty_seat(&mut self, participant: Participant) -> GameResult<Color> {
        if self.seats.is_full() {
            return Err(GameError::Full {
                session_id: self.id.to_string(),
            });
        }
        let color = match (&self.seats.white, &self.seats.black) {
            (Some(_), None) => Color::Black,
            _ => Color::White,
        };
        *self.seats.slot_mut(color) = Some(participant);
        if self.seats.is_full() && self.status == SessionStatus::Pending {
            self.status = SessionStatus::Active;
            info!("[SESSION] {} is now active", self.id);
        }
        Ok(color)
    }

    fn ensure_active(&self) -> GameResult<()> {
        match self.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Over => Err(GameError::SessionOver),
            SessionStatus::Pending => Err(GameError::SessionNotActive),
        }
    }

    fn conclude(&mut self, outcome: GameOverState) {
        info!("[SESSION] {} over: {}", self.id, outcome.message());
        self.outcome = outcome;
        self.status = SessionStatus::Over;
        self.over_since = Some(Instant::now());
    }

    /// Applies a move on behalf of `connection`.
    ///
    /// The requester must hold the seat of the side to move in the
    /// authoritative position; in a hot-seat game one connection holds both.
    pub fn apply<R>(&mut self, rules: &R, connection: ConnectionId, mv: &Move) -> GameResult<MoveRecord>
    where
        R: RulesEngine<Position = P>,
    {
        self.ensure_active()?;
        if !self.holds_seat(connection) {
            return Err(GameError::NotParticipant);
        }
        let to_move = rules.turn_of(&self.position);
        let owns_turn = self
            .seats
            .get(to_move)
            .is_some_and(|p| p.connection_id == Some(connection));
        if !owns_turn {
            return Err(GameError::NotYourTurn);
        }
        self.play(rules, mv)
    }

    /// Applies a move for the scripted seat whose turn it is.
    pub fn apply_scripted<R>(&mut self, rules: &R, mv: &Move) -> GameResult<MoveRecord>
    where
        R: RulesEngine<Position = P>,
    {
        self.ensure_active()?;
        let to_move = rules.turn_of(&self.position);
        if !self.seats.get(to_move).is_some_and(Participant::is_scripted) {
            return Err(GameError::NotYourTurn);
        }
        self.play(rules, mv)
    }

    fn play<R>(&mut self, rules: &R, mv: &Move) -> GameResult<MoveRecord>
    where
        R: RulesEngine<Position = P>,
    {
        let result = rules.apply_move(&self.position, mv)?;
        let record = MoveRecord {
            algebraic: result.algebraic,
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            color: result.mover,
        };
        self.history.add_move(record.clone());
        self.position = result.position;

        let status = rules.terminal_status(&self.position);
        if status.is_terminal() {
            let outcome = GameOverState::from_terminal(status, rules.turn_of(&self.position));
            self.conclude(outcome);
        }
        Ok(record)
    }

    /// The color a request from `connection` acts for: its only seat, or the
    /// side to move when it holds both.
    fn acting_color(&self, connection: ConnectionId, to_move: Color) -> Option<Color> {
        let colors: Vec<Color> = self.seats.colors_of(connection).collect();
        match colors.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => Some(to_move),
        }
    }

    fn opponent_wins(&self, loser: Color) -> (Color, String) {
        let name = self
            .seats
            .get(loser)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| loser.to_string());
        (loser.opposite(), name)
    }

    /// `connection` gives up; their opponent wins.
    pub fn resign<R>(&mut self, rules: &R, connection: ConnectionId) -> GameResult<()>
    where
        R: RulesEngine<Position = P>,
    {
        self.ensure_active()?;
        let loser = self
            .acting_color(connection, rules.turn_of(&self.position))
            .ok_or(GameError::NotParticipant)?;
        let (winner, name) = self.opponent_wins(loser);
        self.conclude(GameOverState::Resigned { winner, name });
        Ok(())
    }

    /// Ends an active game because `connection` went away.
    ///
    /// Returns `false` when there was nothing to forfeit.
    pub fn forfeit<R>(&mut self, rules: &R, connection: ConnectionId) -> bool
    where
        R: RulesEngine<Position = P>,
    {
        if self.status != SessionStatus::Active {
            return false;
        }
        let Some(loser) = self.acting_color(connection, rules.turn_of(&self.position)) else {
            return false;
        };
        let (winner, name) = self.opponent_wins(loser);
        self.conclude(GameOverState::Forfeited { winner, name });
        true
    }

    /// Takes back up to `mode.plies()` moves by replaying the remaining
    /// history from the initial position. Returns the number of plies removed.
    ///
    /// Between two remote players only the author of the last move may undo.
    pub fn undo<R>(&mut self, rules: &R, connection: ConnectionId, mode: UndoMode) -> GameResult<usize>
    where
        R: RulesEngine<Position = P>,
    {
        self.ensure_active()?;
        if !self.holds_seat(connection) {
            return Err(GameError::NotParticipant);
        }
        if self.is_remote_pair() {
            let Some(last) = self.history.last_move() else {
                return Ok(0);
            };
            let authored = self
                .seats
                .get(last.color)
                .is_some_and(|p| p.connection_id == Some(connection));
            if !authored {
                return Err(GameError::UndoNotAllowed);
            }
        }
        let mut history = self.history.clone();
        let removed = history.undo(mode);
        if removed == 0 {
            return Ok(0);
        }
        let position = history.replay(rules, &self.initial)?;
        self.history = history;
        self.position = position;
        Ok(removed)
    }

    /// Resets to the initial position with an empty history and reopens play.
    ///
    /// Two remote players can only start over once the game has ended.
    pub fn new_round(&mut self, connection: ConnectionId) -> GameResult<()> {
        if self.status == SessionStatus::Pending {
            return Err(GameError::SessionNotActive);
        }
        if !self.holds_seat(connection) {
            return Err(GameError::NotParticipant);
        }
        if self.is_remote_pair() && self.status == SessionStatus::Active {
            return Err(GameError::GameInProgress);
        }
        self.history.clear();
        self.position = self.initial.clone();
        self.status = SessionStatus::Active;
        self.outcome = GameOverState::Playing;
        self.over_since = None;
        info!("[SESSION] {} started a new round", self.id);
        Ok(())
    }

    /// Mated king and its attackers, when the game ended in checkmate.
    pub fn highlight<R>(&self, rules: &R) -> Option<CheckmateHighlight>
    where
        R: RulesEngine<Position = P>,
    {
        if !self.outcome.is_checkmate() {
            return None;
        }
        let board = rules.board_snapshot(&self.position);
        checkmate_highlight(&board, rules.turn_of(&self.position))
    }

    /// Per-seat results for human participants once the game is over.
    #[must_use]
    pub fn results(&self) -> Vec<(String, MatchResult)> {
        [Color::White, Color::Black]
            .into_iter()
            .filter_map(|color| {
                let seat = self.seats.get(color)?;
                if seat.is_scripted() {
                    return None;
                }
                let result = self.outcome.result_for(color)?;
                Some((seat.display_name.clone(), result))
            })
            .collect()
    }
}
