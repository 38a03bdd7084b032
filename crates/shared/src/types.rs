//! Board vocabulary and participant types carried on the wire.
//!
//! Squares travel as algebraic strings (`"e4"`), moves as `{from, to, promotion}`
//! objects. Everything here is plain data; no rules knowledge lives in this crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank direction pawns of this color advance in (+1 for White, -1 for Black).
    #[must_use]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Kind of chess piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Material value used by the scripted opponent when ranking captures.
    ///
    /// The king is never capturable and is worth nothing.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    fn from_promotion_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            _ => None,
        }
    }

    /// Lowercase letter used in UCI/FEN notation.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// Errors produced when parsing squares and moves from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid square: {0}")]
    Square(String),

    #[error("invalid move: {0}")]
    Move(String),
}

/// A board square, index 0 (a1) through 63 (h8), file-major within each rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    /// Builds a square from zero-based file (a=0) and rank (1st rank=0).
    #[must_use]
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then(|| Square(rank * 8 + file))
    }

    /// Builds a square from its 0..64 index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        (index < 64).then_some(Square(index))
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// The square `df` files and `dr` ranks away, if it is still on the board.
    #[must_use]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Square::new(file as u8, rank as u8)
        } else {
            None
        }
    }

    /// Iterates all 64 squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        write!(f, "{}{}", file, self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseError::Square(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| ParseError::Square(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// A move request: origin, destination and optional promotion piece.
///
/// Only meaningful relative to the position it was generated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    #[must_use]
    pub const fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Parses coordinate notation such as `e2e4` or `e7e8q`.
impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Move(s.to_string());
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(bad());
        }
        let from: Square = s[0..2].parse().map_err(|_| bad())?;
        let to: Square = s[2..4].parse().map_err(|_| bad())?;
        let promotion = match s[4..].chars().next() {
            Some(c) => Some(PieceKind::from_promotion_char(c).ok_or_else(bad)?),
            None => None,
        };
        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

/// One applied move as shown in a move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// Standard algebraic notation, e.g. `Nf3` or `Qh4#`.
    pub algebraic: String,
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
    pub color: Color,
}

impl MoveRecord {
    /// The move that reproduces this record when replayed.
    #[must_use]
    pub fn as_move(&self) -> Move {
        Move {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

/// Win/loss/draw tally kept by the external profile store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Score {
    pub fn record(&mut self, result: MatchResult) {
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw => self.draws += 1,
        }
    }
}

/// Result of a finished session from one participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

/// What a client says about itself when creating, joining or queueing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub score: Score,
}

impl PlayerProfile {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar: None,
            score: Score::default(),
        }
    }

    /// Skill proxy used for matchmaking: the recorded win count.
    #[must_use]
    pub fn skill(&self) -> u32 {
        self.score.wins
    }
}

/// Scripted opponent strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Who drives a seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "difficulty")]
pub enum ParticipantKind {
    #[default]
    Human,
    ScriptedAi(AiDifficulty),
}

/// Opaque id of one client connection on the real-time channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shareable session code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One seat holder as announced to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// `None` for scripted seats.
    pub connection_id: Option<ConnectionId>,
    pub display_name: String,
    pub avatar: Option<String>,
    pub score: Score,
    pub kind: ParticipantKind,
}

impl Participant {
    pub fn human(connection_id: ConnectionId, profile: PlayerProfile) -> Self {
        Self {
            connection_id: Some(connection_id),
            display_name: profile.display_name,
            avatar: profile.avatar,
            score: profile.score,
            kind: ParticipantKind::Human,
        }
    }

    pub fn scripted(difficulty: AiDifficulty) -> Self {
        let name = match difficulty {
            AiDifficulty::Easy => "Computer (easy)",
            AiDifficulty::Medium => "Computer (medium)",
            AiDifficulty::Hard => "Computer (hard)",
        };
        Self {
            connection_id: None,
            display_name: name.to_string(),
            avatar: None,
            score: Score::default(),
            kind: ParticipantKind::ScriptedAi(difficulty),
        }
    }

    #[must_use]
    pub fn is_scripted(&self) -> bool {
        matches!(self.kind, ParticipantKind::ScriptedAi(_))
    }
}

/// Participant map of a session, one optional seat per color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seats {
    pub white: Option<Participant>,
    pub black: Option<Participant>,
}

impl Seats {
    #[must_use]
    pub fn get(&self, color: Color) -> Option<&Participant> {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, color: Color) -> &mut Option<Participant> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.white.is_some() && self.black.is_some()
    }

    /// Colors whose seat belongs to `connection`.
    pub fn colors_of(&self, connection: ConnectionId) -> impl Iterator<Item = Color> + '_ {
        [Color::White, Color::Black].into_iter().filter(move |c| {
            self.get(*c)
                .is_some_and(|p| p.connection_id == Some(connection))
        })
    }

    /// Distinct human connections seated, white first.
    #[must_use]
    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut out = Vec::with_capacity(2);
        for conn in [&self.white, &self.black]
            .into_iter()
            .flatten()
            .filter_map(|p| p.connection_id)
        {
            if !out.contains(&conn) {
                out.push(conn);
            }
        }
        out
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Over,
}

/// Mated king plus every enemy square attacking it, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckmateHighlight {
    pub king_square: Square,
    pub attackers: Vec<Square>,
}
