//! Rules engine adapter over `shakmaty`
//!
//! Wraps a `shakmaty::Chess` position together with the repetition keys seen
//! since the start of the game, so threefold repetition can be reported as a
//! terminal status alongside checkmate, stalemate, insufficient material and
//! the fifty-move rule.

use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, EnPassantMode, Position, Role,
};
use tracing::debug;

use super::RulesEngine;
use crate::game::error::{GameError, GameResult};
use crate::game::types::{BoardSnapshot, LegalMove, MoveResult, Piece, TerminalStatus};
use shared::{Color, Move, PieceKind, Square};

/// Halfmove clock value at which the fifty-move draw applies.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Number of occurrences of the same position that ends the game.
const REPETITION_LIMIT: usize = 3;

/// The FEN could not be parsed into a legal position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid FEN: {0}")]
pub struct InvalidFen(pub String);

/// Opaque position handed out by [`ShakmatyRules`].
#[derive(Debug, Clone)]
pub struct ChessPosition {
    board: Chess,
    /// Repetition keys of every position reached so far, current one last.
    seen: Vec<String>,
}

impl ChessPosition {
    fn start(board: Chess) -> Self {
        let key = repetition_key(&board);
        Self {
            board,
            seen: vec![key],
        }
    }

    fn advance(&self, board: Chess) -> Self {
        let mut seen = self.seen.clone();
        seen.push(repetition_key(&board));
        Self { board, seen }
    }

    fn is_repetition(&self) -> bool {
        self.seen
            .last()
            .is_some_and(|current| self.seen.iter().filter(|k| *k == current).count() >= REPETITION_LIMIT)
    }
}

/// Placement, side to move, castling rights and en-passant square.
fn repetition_key(board: &Chess) -> String {
    let fen = Fen::from_position(board.clone(), EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Standard chess rules backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a position from a FEN string.
    pub fn position_from_fen(&self, fen: &str) -> Result<ChessPosition, InvalidFen> {
        let parsed: Fen = fen.parse().map_err(|e| InvalidFen(format!("{e}")))?;
        let board: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| InvalidFen(format!("{e}")))?;
        Ok(ChessPosition::start(board))
    }

    fn resolve(&self, board: &Chess, mv: &Move) -> GameResult<shakmaty::Move> {
        let uci = UciMove::Normal {
            from: to_engine_square(mv.from),
            to: to_engine_square(mv.to),
            promotion: mv.promotion.map(to_role),
        };
        uci.to_move(board)
            .map_err(|_| GameError::IllegalMove(mv.to_string()))
    }

    fn describe(&self, board: &Chess, m: &shakmaty::Move) -> Option<LegalMove> {
        // Castling is reported king-to-destination (e1g1), not king-takes-rook.
        let (from, to, promotion) = match UciMove::from_move(m, CastlingMode::Standard) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => (from, to, promotion),
            _ => return None,
        };
        let mv = Move {
            from: from_engine_square(from)?,
            to: from_engine_square(to)?,
            promotion: promotion.map(from_role),
        };
        Some(LegalMove {
            mv,
            algebraic: San::from_move(board, m).to_string(),
            is_capture: m.is_capture(),
            captured: m.capture().map(from_role),
        })
    }
}

impl RulesEngine for ShakmatyRules {
    type Position = ChessPosition;

    fn initial_position(&self) -> ChessPosition {
        ChessPosition::start(Chess::default())
    }

    fn legal_moves(&self, position: &ChessPosition, from: Option<Square>) -> Vec<LegalMove> {
        let board = &position.board;
        board
            .legal_moves()
            .iter()
            .filter_map(|m| self.describe(board, m))
            .filter(|legal| from.is_none_or(|sq| legal.mv.from == sq))
            .collect()
    }

    fn apply_move(&self, position: &ChessPosition, mv: &Move) -> GameResult<MoveResult<ChessPosition>> {
        let board = &position.board;
        let m = self.resolve(board, mv)?;
        let san = San::from_move(board, &m).to_string();
        let mover = from_engine_color(board.turn());
        let captured = m.capture().map(from_role);

        let next = board
            .clone()
            .play(&m)
            .map_err(|_| GameError::IllegalMove(mv.to_string()))?;

        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };
        debug!("[RULES] {} played {}{}", mover, san, suffix);

        Ok(MoveResult {
            position: position.advance(next),
            algebraic: format!("{san}{suffix}"),
            mover,
            captured,
        })
    }

    fn terminal_status(&self, position: &ChessPosition) -> TerminalStatus {
        let board = &position.board;
        if board.is_checkmate() {
            TerminalStatus::Checkmate
        } else if board.is_stalemate() {
            TerminalStatus::Stalemate
        } else if position.is_repetition() {
            TerminalStatus::Repetition
        } else if board.is_insufficient_material() {
            TerminalStatus::InsufficientMaterial
        } else if board.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            TerminalStatus::FiftyMove
        } else {
            TerminalStatus::None
        }
    }

    fn board_snapshot(&self, position: &ChessPosition) -> BoardSnapshot {
        let pieces = position.board.board();
        let mut snapshot = BoardSnapshot::empty();
        for square in Square::all() {
            if let Some(piece) = pieces.piece_at(to_engine_square(square)) {
                snapshot.put(
                    square,
                    Piece::new(from_role(piece.role), from_engine_color(piece.color)),
                );
            }
        }
        snapshot
    }

    fn turn_of(&self, position: &ChessPosition) -> Color {
        from_engine_color(position.board.turn())
    }

    fn in_check(&self, position: &ChessPosition) -> bool {
        position.board.is_check()
    }

    fn encode(&self, position: &ChessPosition) -> String {
        Fen::from_position(position.board.clone(), EnPassantMode::Legal).to_string()
    }
}

fn to_engine_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

fn from_engine_square(square: shakmaty::Square) -> Option<Square> {
    Square::from_index(u32::from(square) as u8)
}

fn from_engine_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}
