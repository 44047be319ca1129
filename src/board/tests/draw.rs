//! Draw detection tests.

use crate::board::{Board, Square};

fn apply_uci(board: &mut Board, uci: &str) {
    let mv = board.parse_uci_move(uci).expect("uci move not legal");
    board.make_move(mv);
}

#[test]
fn test_fen_halfmove_parsing() {
    let board = Board::from_fen("8/8/8/8/8/8/8/K1k5 w - - 57 1");
    assert_eq!(board.halfmove_clock(), 57);
}

#[test]
fn test_fifty_move_rule_draw() {
    let board = Board::from_fen("8/8/8/8/8/8/4P3/K1k5 w - - 100 1");
    assert!(board.is_fifty_move_draw());
    assert!(board.is_draw());
}

#[test]
fn test_halfmove_resets_on_pawn_move() {
    let mut board = Board::from_fen("8/8/8/8/8/8/4P3/K1k5 w - - 99 1");
    apply_uci(&mut board, "e2e4");
    assert_eq!(board.halfmove_clock(), 0);
    assert!(!board.is_draw());
}

#[test]
fn test_halfmove_counts_quiet_moves() {
    let mut board = Board::from_fen("8/8/8/8/8/8/4P3/K1k5 w - - 98 1");
    apply_uci(&mut board, "a1a2");
    assert!(!board.is_fifty_move_draw());
    apply_uci(&mut board, "c1c2");
    assert!(board.is_fifty_move_draw());
}

#[test]
fn test_repetition_after_knight_shuffle() {
    let mut board = Board::new();
    apply_uci(&mut board, "g1f3");
    apply_uci(&mut board, "g8f6");
    apply_uci(&mut board, "f3g1");
    assert!(!board.is_repetition());
    apply_uci(&mut board, "f6g8");
    assert!(board.is_repetition());
    assert!(board.is_draw());
}

#[test]
fn test_repetition_does_not_cross_irreversible_move() {
    let mut board = Board::new();
    apply_uci(&mut board, "g1f3");
    apply_uci(&mut board, "g8f6");
    apply_uci(&mut board, "e2e4");
    apply_uci(&mut board, "f6g8");
    apply_uci(&mut board, "f3g1");
    apply_uci(&mut board, "g8f6");
    assert!(!board.is_repetition());
}

#[test]
fn test_unmake_restores_repetition_state() {
    let mut board = Board::new();
    apply_uci(&mut board, "g1f3");
    apply_uci(&mut board, "g8f6");
    apply_uci(&mut board, "f3g1");
    let mv = board.parse_uci_move("f6g8").expect("legal");
    let info = board.make_move(mv);
    assert!(board.is_repetition());
    board.unmake_move(mv, info);
    assert!(!board.is_repetition());
}

#[test]
fn test_null_move_breaks_repetition_chain() {
    let mut board = Board::new();
    let start_hash = board.hash();
    apply_uci(&mut board, "g1f3");
    let first = board.make_null_move();
    let back = board.parse_uci_move("f3g1").expect("legal");
    let info = board.make_move(back);
    let second = board.make_null_move();
    assert_eq!(board.hash(), start_hash);
    assert!(!board.is_repetition());

    board.unmake_null_move(second);
    board.unmake_move(back, info);
    board.unmake_null_move(first);
    assert_eq!(board.hash(), board.compute_hash());
}

#[test]
fn test_insufficient_material() {
    let cases = [
        ("8/8/8/8/8/8/8/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/8/6N1/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/8/6B1/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/5b2/6B1/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/5n2/6B1/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/5NN1/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/6P1/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/6R1/K1k5 w - - 0 1", false),
    ];
    for (fen, expected) in cases {
        let board = Board::from_fen(fen);
        assert_eq!(board.is_insufficient_material(), expected, "{fen}");
    }
}

#[test]
fn test_checkmate_and_stalemate_detection() {
    let mut mated = Board::from_fen("7k/7Q/7K/8/8/8/8/8 b - - 0 1");
    assert!(mated.is_checkmate());
    assert!(!mated.is_stalemate());

    let mut stalemated = Board::from_fen("k7/8/1QK5/8/8/8/8/8 b - - 0 1");
    assert!(stalemated.is_stalemate());
    assert!(!stalemated.is_checkmate());
    assert!(!stalemated.in_check());
}

#[test]
fn test_fen_round_trip() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 13 40",
    ];
    for fen in fens {
        assert_eq!(Board::from_fen(fen).to_fen(), fen);
    }
    assert_eq!(Board::from_fen(fens[2]).en_passant(), Some(Square::new(5, 5)));
}
