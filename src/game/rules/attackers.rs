//! Geometric attacker scan over a [`BoardSnapshot`]
//!
//! Used after a checkmate to tell clients which enemy pieces deliver the
//! mate. Purely geometric: pins and legality are irrelevant here, a piece
//! attacks a square if it could capture on it ignoring everything else.

use crate::game::types::BoardSnapshot;
use shared::{CheckmateHighlight, Color, PieceKind, Square};

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Squares of `by` pieces attacking `target`, sorted and deduplicated.
#[must_use]
pub fn attackers_of(board: &BoardSnapshot, target: Square, by: Color) -> Vec<Square> {
    let mut found = Vec::new();

    let owned_by = |sq: Square, kinds: &[PieceKind]| {
        board
            .piece_at(sq)
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    slide(board, target, &ORTHOGONAL, |sq| {
        if owned_by(sq, &[PieceKind::Rook, PieceKind::Queen]) {
            found.push(sq);
        }
    });
    slide(board, target, &DIAGONAL, |sq| {
        if owned_by(sq, &[PieceKind::Bishop, PieceKind::Queen]) {
            found.push(sq);
        }
    });

    for (df, dr) in KNIGHT {
        if let Some(sq) = target.offset(df, dr) {
            if owned_by(sq, &[PieceKind::Knight]) {
                found.push(sq);
            }
        }
    }

    // A pawn of `by` attacks diagonally forward, so it sits one rank behind the target.
    for df in [-1, 1] {
        if let Some(sq) = target.offset(df, -by.forward()) {
            if owned_by(sq, &[PieceKind::Pawn]) {
                found.push(sq);
            }
        }
    }

    for (df, dr) in KING {
        if let Some(sq) = target.offset(df, dr) {
            if owned_by(sq, &[PieceKind::King]) {
                found.push(sq);
            }
        }
    }

    found.sort();
    found.dedup();
    found
}

/// Walks each ray from `origin`, reporting the first occupied square on it.
fn slide(board: &BoardSnapshot, origin: Square, rays: &[(i8, i8)], mut hit: impl FnMut(Square)) {
    for &(df, dr) in rays {
        let mut current = origin;
        while let Some(next) = current.offset(df, dr) {
            if board.piece_at(next).is_some() {
                hit(next);
                break;
            }
            current = next;
        }
    }
}

/// King square of the mated side and the enemy squares attacking it.
///
/// Returns `None` if the board has no king of that color.
#[must_use]
pub fn checkmate_highlight(board: &BoardSnapshot, mated: Color) -> Option<CheckmateHighlight> {
    let king_square = board.find_king(mated)?;
    Some(CheckmateHighlight {
        king_square,
        attackers: attackers_of(board, king_square, mated.opposite()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn board(fen: &str) -> BoardSnapshot {
        BoardSnapshot::from_placement(fen).expect("valid placement")
    }

    #[test]
    fn test_rook_ray_stops_at_blocker() {
        // Rook a1 is screened from h1 by its own pawn on c1
        let b = board("8/8/8/8/8/8/8/R1P4k");
        assert!(attackers_of(&b, sq("h1"), Color::White).is_empty());
        assert_eq!(attackers_of(&b, sq("b1"), Color::White), vec![sq("a1")]);
    }

    #[test]
    fn test_pawn_attack_direction() {
        // White pawn e4 attacks d5 and f5, not d3
        let b = board("8/8/8/8/4P3/8/8/8");
        assert_eq!(attackers_of(&b, sq("d5"), Color::White), vec![sq("e4")]);
        assert_eq!(attackers_of(&b, sq("f5"), Color::White), vec![sq("e4")]);
        assert!(attackers_of(&b, sq("d3"), Color::White).is_empty());

        // Black pawn e5 attacks d4
        let b = board("8/8/8/4p3/8/8/8/8");
        assert_eq!(attackers_of(&b, sq("d4"), Color::Black), vec![sq("e5")]);
        assert!(attackers_of(&b, sq("d6"), Color::Black).is_empty());
    }

    #[test]
    fn test_knight_and_king_attacks() {
        let b = board("8/8/8/8/8/5N2/8/4K3");
        assert_eq!(attackers_of(&b, sq("e2"), Color::White), vec![sq("e1")]);
        assert_eq!(attackers_of(&b, sq("g1"), Color::White), vec![sq("f3")]);
        assert_eq!(attackers_of(&b, sq("d2"), Color::White), vec![sq("e1"), sq("f3")]);
    }

    #[test]
    fn test_ignores_other_color() {
        let b = board("8/8/8/8/8/8/8/r6K");
        assert!(attackers_of(&b, sq("h1"), Color::White).is_empty());
        assert_eq!(attackers_of(&b, sq("h1"), Color::Black), vec![sq("a1")]);
    }

    #[test]
    fn test_highlight_back_rank_mate() {
        let b = board("R5k1/5ppp/8/8/8/8/8/6K1");
        let highlight = checkmate_highlight(&b, Color::Black).unwrap();
        assert_eq!(highlight.king_square, sq("g8"));
        assert_eq!(highlight.attackers, vec![sq("a8")]);
    }

    #[test]
    fn test_highlight_without_king() {
        assert!(checkmate_highlight(&BoardSnapshot::empty(), Color::White).is_none());
    }
}
