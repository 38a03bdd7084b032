use super::*;
use crate::game::error::GameError;
use crate::game::types::TerminalStatus;
use shared::PieceKind;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn mv(s: &str) -> Move {
    s.parse().unwrap()
}

fn play_all(rules: &ShakmatyRules, moves: &[&str]) -> ChessPosition {
    let mut position = rules.initial_position();
    for m in moves {
        position = rules
            .apply_move(&position, &mv(m))
            .unwrap_or_else(|e| panic!("{m} should be legal: {e}"))
            .position;
    }
    position
}

#[test]
fn test_initial_position() {
    let rules = ShakmatyRules::new();
    let position = rules.initial_position();
    assert_eq!(rules.encode(&position), START_FEN);
    assert_eq!(rules.turn_of(&position), Color::White);
    assert_eq!(rules.legal_moves(&position, None).len(), 20);
    assert_eq!(rules.terminal_status(&position), TerminalStatus::None);
}

#[test]
fn test_legal_moves_from_square() {
    let rules = ShakmatyRules::new();
    let position = rules.initial_position();
    let from_e2 = rules.legal_moves(&position, Some(sq("e2")));
    assert_eq!(from_e2.len(), 2);
    assert!(from_e2.iter().all(|m| m.mv.from == sq("e2")));
    assert!(rules.legal_moves(&position, Some(sq("e4"))).is_empty());
}

#[test]
fn test_apply_move_flips_turn() {
    let rules = ShakmatyRules::new();
    let start = rules.initial_position();
    let result = rules.apply_move(&start, &mv("e2e4")).unwrap();

    assert_eq!(result.algebraic, "e4");
    assert_eq!(result.mover, Color::White);
    assert_eq!(result.captured, None);
    assert_eq!(rules.turn_of(&result.position), Color::Black);
    assert_eq!(
        rules.encode(&result.position),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
    // The input position is untouched
    assert_eq!(rules.encode(&start), START_FEN);
}

#[test]
fn test_illegal_move_rejected() {
    let rules = ShakmatyRules::new();
    let position = rules.initial_position();
    match rules.apply_move(&position, &mv("e2e5")) {
        Err(GameError::IllegalMove(text)) => assert_eq!(text, "e2e5"),
        other => panic!("expected IllegalMove, got {other:?}"),
    }
}

#[test]
fn test_fools_mate_is_checkmate() {
    let rules = ShakmatyRules::new();
    let position = play_all(&rules, &["f2f3", "e7e5", "g2g4"]);
    let result = rules.apply_move(&position, &mv("d8h4")).unwrap();

    assert_eq!(result.algebraic, "Qh4#");
    assert_eq!(rules.terminal_status(&result.position), TerminalStatus::Checkmate);
    assert!(rules.in_check(&result.position));

    let board = rules.board_snapshot(&result.position);
    let highlight = checkmate_highlight(&board, Color::White).unwrap();
    assert_eq!(highlight.king_square, sq("e1"));
    assert_eq!(highlight.attackers, vec![sq("h4")]);
}

#[test]
fn test_check_suffix() {
    let rules = ShakmatyRules::new();
    let position = play_all(&rules, &["e2e4", "f7f6"]);
    let result = rules.apply_move(&position, &mv("d1h5")).unwrap();
    assert_eq!(result.algebraic, "Qh5+");
}

#[test]
fn test_capture_reports_victim() {
    let rules = ShakmatyRules::new();
    let position = play_all(&rules, &["e2e4", "d7d5"]);
    let legal = rules.legal_moves(&position, Some(sq("e4")));
    let capture = legal.iter().find(|m| m.mv.to == sq("d5")).unwrap();
    assert!(capture.is_capture);
    assert_eq!(capture.captured, Some(PieceKind::Pawn));

    let result = rules.apply_move(&position, &mv("e4d5")).unwrap();
    assert_eq!(result.algebraic, "exd5");
    assert_eq!(result.captured, Some(PieceKind::Pawn));
}

#[test]
fn test_stalemate() {
    let rules = ShakmatyRules::new();
    let position = rules
        .position_from_fen("8/8/8/8/8/6q1/5k2/7K w - - 0 1")
        .unwrap();
    assert!(rules.legal_moves(&position, None).is_empty());
    assert_eq!(rules.terminal_status(&position), TerminalStatus::Stalemate);
}

#[test]
fn test_insufficient_material() {
    let rules = ShakmatyRules::new();
    let position = rules
        .position_from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1")
        .unwrap();
    assert_eq!(
        rules.terminal_status(&position),
        TerminalStatus::InsufficientMaterial
    );
}

#[test]
fn test_fifty_move_rule() {
    let rules = ShakmatyRules::new();
    let position = rules
        .position_from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 100 80")
        .unwrap();
    assert_eq!(rules.terminal_status(&position), TerminalStatus::FiftyMove);

    let fresh = rules
        .position_from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 99 80")
        .unwrap();
    assert_eq!(rules.terminal_status(&fresh), TerminalStatus::None);
}

#[test]
fn test_threefold_repetition() {
    let rules = ShakmatyRules::new();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

    let twice: Vec<&str> = shuffle.iter().copied().cycle().take(7).collect();
    let position = play_all(&rules, &twice);
    assert_eq!(rules.terminal_status(&position), TerminalStatus::None);

    let thrice: Vec<&str> = shuffle.iter().copied().cycle().take(8).collect();
    let position = play_all(&rules, &thrice);
    assert_eq!(rules.terminal_status(&position), TerminalStatus::Repetition);
}

#[test]
fn test_promotion_requires_piece() {
    let rules = ShakmatyRules::new();
    let position = rules
        .position_from_fen("8/P7/8/8/8/8/8/k3K3 w - - 0 1")
        .unwrap();

    assert!(matches!(
        rules.apply_move(&position, &mv("a7a8")),
        Err(GameError::IllegalMove(_))
    ));

    let result = rules.apply_move(&position, &mv("a7a8q")).unwrap();
    assert_eq!(result.algebraic, "a8=Q+");
    let board = rules.board_snapshot(&result.position);
    assert_eq!(
        board.piece_at(sq("a8")).map(|p| p.kind),
        Some(PieceKind::Queen)
    );
}

#[test]
fn test_castling_uses_king_destination() {
    let rules = ShakmatyRules::new();
    let position = rules
        .position_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
        .unwrap();
    let king_moves = rules.legal_moves(&position, Some(sq("e1")));
    assert!(king_moves.iter().any(|m| m.mv == mv("e1g1")));
    assert!(king_moves.iter().any(|m| m.mv == mv("e1c1")));

    let result = rules.apply_move(&position, &mv("e1g1")).unwrap();
    assert_eq!(result.algebraic, "O-O");
    let board = rules.board_snapshot(&result.position);
    assert_eq!(board.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
}

#[test]
fn test_invalid_fen() {
    let rules = ShakmatyRules::new();
    assert!(rules.position_from_fen("not a fen").is_err());
}
