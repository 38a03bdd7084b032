//! Error types for game module
//!
//! Every variant is local to one request or turn. Raising one never leaves a
//! session's position or history partially updated.

use shared::ErrorReason;

/// Errors that can occur in session orchestration and move handling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Unknown session id
    #[error("Session not found: {session_id}")]
    NotFound { session_id: String },

    /// Both seats of the session are already taken
    #[error("Session {session_id} is full")]
    Full { session_id: String },

    /// Requester does not hold the seat of the side to move
    #[error("Not your turn")]
    NotYourTurn,

    /// The rules engine rejected the move
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// Scripted opponent was asked to move in a position with no legal moves
    #[error("Scripted opponent found no legal move")]
    AiExhausted,

    /// Session already reached a terminal state
    #[error("Session is over")]
    SessionOver,

    /// Session is still waiting for its second participant
    #[error("Session has not started")]
    SessionNotActive,

    /// Requester holds no seat in the session
    #[error("Not a participant of this session")]
    NotParticipant,

    /// Connection is already attached to a live session
    #[error("Already in session {session_id}")]
    AlreadyInSession { session_id: String },

    /// A new round between two remote players needs the current game to be over
    #[error("Game still in progress")]
    GameInProgress,

    /// Between two remote players only the author of the last move may take it back
    #[error("Only the player who made the last move can undo it")]
    UndoNotAllowed,

    /// No unused session code was found
    #[error("No free session code after {attempts} attempts")]
    CodesExhausted { attempts: usize },
}

impl GameError {
    /// Wire category for this error.
    #[must_use]
    pub fn reason(&self) -> ErrorReason {
        match self {
            GameError::NotFound { .. } => ErrorReason::NotFound,
            GameError::Full { .. } => ErrorReason::Full,
            GameError::NotYourTurn => ErrorReason::NotYourTurn,
            GameError::IllegalMove(_) => ErrorReason::IllegalMove,
            GameError::AiExhausted => ErrorReason::AiExhausted,
            GameError::SessionOver => ErrorReason::SessionOver,
            GameError::SessionNotActive => ErrorReason::SessionNotActive,
            GameError::NotParticipant => ErrorReason::NotParticipant,
            GameError::AlreadyInSession { .. } => ErrorReason::AlreadyInSession,
            GameError::GameInProgress => ErrorReason::GameInProgress,
            GameError::UndoNotAllowed => ErrorReason::UndoNotAllowed,
            GameError::CodesExhausted { .. } => ErrorReason::CodesExhausted,
        }
    }
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
