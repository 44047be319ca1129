//! Make/unmake move tests.

use std::sync::Arc;

use crate::board::nnue::NnueNetwork;
use crate::board::{Board, Color, Move, Piece, Square};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn with_network(fen: &str) -> Board {
    let mut board = Board::from_fen(fen);
    board.set_network(Arc::new(NnueNetwork::material()));
    board
}

fn find_move(board: &mut Board, uci: &str) -> Move {
    board.parse_uci_move(uci).expect("legal move")
}

/// Every hash field must match a from-scratch computation.
fn assert_keys_consistent(board: &Board) {
    assert_eq!(board.hash(), board.compute_hash(), "hash drifted at {}", board.to_fen());
    let (pawn, non_pawn, minor) = board.compute_sub_keys();
    assert_eq!(board.pawn_key(), pawn);
    assert_eq!(board.non_pawn_key(Color::White), non_pawn[0]);
    assert_eq!(board.non_pawn_key(Color::Black), non_pawn[1]);
    assert_eq!(board.minor_key(), minor);
}

/// Walk the whole tree to `depth`, checking keys after every make and full
/// restoration after every unmake.
fn walk(board: &mut Board, depth: u32) {
    if depth == 0 {
        return;
    }
    let fen = board.to_fen();
    let hash = board.hash();
    let acc = board.accumulator().cloned();
    for mv in board.generate_moves().iter().copied() {
        let info = board.make_move(mv);
        assert_keys_consistent(board);
        walk(board, depth - 1);
        board.unmake_move(mv, info);
        assert_eq!(board.hash(), hash);
        assert_eq!(board.to_fen(), fen);
        assert!(board.accumulator().cloned() == acc, "accumulator not restored after {mv}");
    }
}

#[test]
fn test_keys_incremental_from_start() {
    walk(&mut Board::new(), 3);
}

#[test]
fn test_keys_incremental_kiwipete() {
    walk(&mut Board::from_fen(KIWIPETE), 2);
}

#[test]
fn test_accumulator_restored_kiwipete() {
    walk(&mut with_network(KIWIPETE), 2);
}

#[test]
fn test_incremental_accumulator_matches_refresh() {
    let lines: [&[&str]; 2] = [
        // Castling and captures
        &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1", "f6e4", "d2d3", "e4f6"],
        // Both kings cross the d/e midline
        &["e2e4", "e7e5", "e1e2", "e8e7", "e2d3", "e7d6"],
    ];
    for line in lines {
        let mut board = with_network("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        for uci in line {
            let mv = find_move(&mut board, uci);
            board.make_move(mv);
        }
        let fresh = with_network(&board.to_fen());
        assert!(board.accumulator() == fresh.accumulator());
        assert_eq!(board.evaluate(), fresh.evaluate());
    }
}

#[test]
fn test_en_passant_make_unmake() {
    let mut board = Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
    let original_hash = board.hash();
    let mv = find_move(&mut board, "e5f6");
    assert!(mv.is_en_passant());
    let info = board.make_move(mv);
    assert_eq!(board.piece_at(Square::new(4, 5)), None);
    assert_eq!(board.piece_at(Square::new(5, 5)), Some((Color::White, Piece::Pawn)));
    board.unmake_move(mv, info);
    assert_eq!(board.hash(), original_hash);
    assert_eq!(board.en_passant(), Some(Square::new(5, 5)));
    assert_eq!(board.piece_at(Square::new(4, 5)), Some((Color::Black, Piece::Pawn)));
}

#[test]
fn test_promotion_make_unmake() {
    let mut board = Board::from_fen("8/P7/8/8/8/8/8/K1k5 w - - 0 1");
    let original_hash = board.hash();
    let mv = find_move(&mut board, "a7a8q");
    assert_eq!(mv.promotion_piece(), Some(Piece::Queen));
    let info = board.make_move(mv);
    assert_eq!(board.piece_at(Square::new(7, 0)), Some((Color::White, Piece::Queen)));
    board.unmake_move(mv, info);
    assert_eq!(board.hash(), original_hash);
    assert_eq!(board.piece_at(Square::new(6, 0)), Some((Color::White, Piece::Pawn)));
}

#[test]
fn test_castling_rights_lost_on_rook_capture() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1");
    let mv = find_move(&mut board, "g2h1");
    let info = board.make_move(mv);
    assert_eq!(board.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2b w Qkq - 0 2");
    assert_keys_consistent(&board);
    board.unmake_move(mv, info);
    assert_eq!(board.to_fen(), "r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1");
}

#[test]
fn test_null_move_make_unmake_restores_hash_and_ep() {
    let mut board = Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
    let original_hash = board.hash();

    let info = board.make_null_move();
    assert_eq!(board.en_passant(), None);
    assert_eq!(board.side_to_move(), Color::Black);
    assert_eq!(board.hash(), board.compute_hash());

    board.unmake_null_move(info);
    assert_eq!(board.hash(), original_hash);
    assert_eq!(board.en_passant(), Some(Square::new(5, 5)));
    assert_eq!(board.side_to_move(), Color::White);
}

#[test]
fn test_pseudo_legal_pin_rejected_after_make() {
    // The e2 knight is pinned against the king
    let mut board = Board::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
    let mv = Move::quiet(Square::new(1, 4), Square::new(3, 3), Piece::Knight);
    assert!(board.is_pseudo_legal(mv));
    let info = board.make_move(mv);
    assert!(!board.is_legal_after_move(mv));
    board.unmake_move(mv, info);
    assert!(!board.generate_moves().contains(mv));
}

#[test]
fn test_castling_through_check_rejected() {
    // The f1 square is attacked by the c4 bishop
    let mut board = Board::from_fen("4k3/8/8/8/2b5/8/8/4K2R w K - 0 1");
    let moves = board.generate_moves();
    assert!(!moves.iter().any(|m| m.is_castling()));
}
