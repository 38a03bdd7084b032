//! Core game types shared by the rules adapter, the scripted opponent and sessions

use shared::{Color, Move, PieceKind, Square};

/// A colored piece on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    #[must_use]
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Self { kind, color })
    }
}

/// Read-only copy of piece placement, detached from any rules engine.
///
/// Indexed by [`Square::index`]; a1 is 0, h8 is 63.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    squares: [Option<Piece>; 64],
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoardSnapshot {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            squares: [None; 64],
        }
    }

    /// Parses the placement field of a FEN string (`rnbqkbnr/pppppppp/8/...`).
    ///
    /// Trailing FEN fields are ignored, so a full FEN is accepted too.
    #[must_use]
    pub fn from_placement(fen: &str) -> Option<Self> {
        let placement = fen.split_whitespace().next()?;
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return None;
        }

        let mut board = Self::empty();
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return None;
                    }
                    file = file.checked_add(skip as u8).filter(|f| *f <= 8)?;
                    continue;
                }
                let square = Square::new(file, rank)?;
                board.put(square, Piece::from_fen_char(c)?);
                file += 1;
            }
            if file != 8 {
                return None;
            }
        }
        Some(board)
    }

    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index() as usize]
    }

    pub fn put(&mut self, square: Square, piece: Piece) {
        self.squares[square.index() as usize] = Some(piece);
    }

    /// Square of the king of `color`, scanning a1 → h8.
    #[must_use]
    pub fn find_king(&self, color: Color) -> Option<Square> {
        Square::all().find(|sq| self.piece_at(*sq) == Some(Piece::new(PieceKind::King, color)))
    }
}

/// Terminal condition reported by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    None,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    Repetition,
    FiftyMove,
}

impl TerminalStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != TerminalStatus::None
    }
}

/// A legal move in a specific position, with the facts the scripted opponent ranks by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalMove {
    pub mv: Move,
    /// Standard algebraic notation in the position it was generated from.
    pub algebraic: String,
    pub is_capture: bool,
    /// Kind of the captured piece; `Pawn` for en passant.
    pub captured: Option<PieceKind>,
}

/// Outcome of applying a move through the rules engine.
#[derive(Debug, Clone)]
pub struct MoveResult<P> {
    pub position: P,
    pub algebraic: String,
    pub mover: Color,
    pub captured: Option<PieceKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_placement_start_position() {
        let board =
            BoardSnapshot::from_placement("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
                .unwrap();
        let e1: Square = "e1".parse().unwrap();
        let d8: Square = "d8".parse().unwrap();
        assert_eq!(
            board.piece_at(e1),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.piece_at(d8),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(board.piece_at("e4".parse().unwrap()), None);
    }

    #[test]
    fn test_from_placement_rejects_bad_rank() {
        assert!(BoardSnapshot::from_placement("8/8/8/8/8/8/8").is_none());
        assert!(BoardSnapshot::from_placement("9/8/8/8/8/8/8/8").is_none());
        assert!(BoardSnapshot::from_placement("x7/8/8/8/8/8/8/8").is_none());
    }

    #[test]
    fn test_from_placement_rejects_oversized_gaps() {
        // Long digit runs must not wrap the file counter back to 8
        let long_run = "9".repeat(32);
        let fen = format!("{long_run}/8/8/8/8/8/8/8");
        assert!(BoardSnapshot::from_placement(&fen).is_none());
        // 33 eights sum to 264, which is 8 modulo 256
        let wrapping = format!("{}/8/8/8/8/8/8/8", "8".repeat(33));
        assert!(BoardSnapshot::from_placement(&wrapping).is_none());
        assert!(BoardSnapshot::from_placement("44/8/8/8/8/8/8/8").is_some());
        assert!(BoardSnapshot::from_placement("08/8/8/8/8/8/8/8").is_none());
        assert!(BoardSnapshot::from_placement("k8/8/8/8/8/8/8/8").is_none());
    }

    #[test]
    fn test_find_king() {
        let board = BoardSnapshot::from_placement("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(board.find_king(Color::Black), Some("e8".parse().unwrap()));
        assert_eq!(board.find_king(Color::White), Some("e1".parse().unwrap()));
        assert_eq!(BoardSnapshot::empty().find_king(Color::White), None);
    }

    #[test]
    fn test_terminal_status_is_terminal() {
        assert!(!TerminalStatus::None.is_terminal());
        assert!(TerminalStatus::Checkmate.is_terminal());
        assert!(TerminalStatus::FiftyMove.is_terminal());
    }
}
