//! Message contracts for the real-time channel.
//!
//! Messages are JSON objects tagged by `type`, e.g.
//! `{"type":"submitMove","sessionId":"K3X9QZ2A","move":{"from":"e2","to":"e4"}}`.
//! Positions travel as FEN strings.

use serde::{Deserialize, Serialize};

use crate::types::{
    AiDifficulty, CheckmateHighlight, Color, Move, MoveRecord, PlayerProfile, Seats, SessionId,
};

/// Client → server requests
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateSession {
        participant: PlayerProfile,
    },
    JoinSession {
        session_id: SessionId,
        participant: PlayerProfile,
    },
    /// Play against the scripted opponent. `color` is the human's color; random if absent.
    CreateAiSession {
        participant: PlayerProfile,
        difficulty: AiDifficulty,
        #[serde(default)]
        color: Option<Color>,
    },
    /// Hot-seat game: both seats belong to this connection.
    CreateLocalSession {
        white: PlayerProfile,
        black: PlayerProfile,
    },
    EnqueueForMatch {
        participant: PlayerProfile,
    },
    CancelQueue,
    SubmitMove {
        session_id: SessionId,
        #[serde(rename = "move")]
        mv: Move,
    },
    Resign {
        session_id: SessionId,
    },
    Undo {
        session_id: SessionId,
    },
    NewRound {
        session_id: SessionId,
    },
}

/// Server → client pushes and replies
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    GameCreated {
        session_id: SessionId,
        color: Color,
    },
    JoinedGame {
        session_id: SessionId,
        color: Color,
        position: String,
    },
    SearchingForMatch,
    MatchFound {
        session_id: SessionId,
        position: String,
        participants: Seats,
    },
    MatchmakingCancelled,
    /// Sent once both seats are filled, and again after a new round.
    SessionStarted {
        session_id: SessionId,
        position: String,
        participants: Seats,
    },
    MoveApplied {
        session_id: SessionId,
        #[serde(rename = "move")]
        record: MoveRecord,
        position: String,
    },
    /// Authoritative state after an undo.
    PositionReset {
        session_id: SessionId,
        position: String,
        history: Vec<MoveRecord>,
    },
    SessionOver {
        session_id: SessionId,
        /// `None` for a draw.
        winner: Option<Color>,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        highlight: Option<CheckmateHighlight>,
    },
    Error {
        reason: ErrorReason,
        message: String,
    },
}

/// Machine-readable error category sent with [`ServerMessage::Error`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorReason {
    NotFound,
    Full,
    NotYourTurn,
    IllegalMove,
    AiExhausted,
    SessionOver,
    SessionNotActive,
    NotParticipant,
    AlreadyInSession,
    GameInProgress,
    UndoNotAllowed,
    CodesExhausted,
    /// Frame was not a recognisable client message.
    InvalidMessage,
}
