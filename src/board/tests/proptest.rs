//! Property-based tests using proptest.

use std::sync::Arc;

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng;

use crate::board::nnue::NnueNetwork;
use crate::board::search::{ContKey, HistoryTables, SearchParams, CORRHIST_MAX, HISTORY_MAX, MATE, MATE_BOUND};
use crate::board::{Bitboard, Board, Color, Move, Piece, Square, UnmakeInfo};
use crate::tt::{Bound, TranspositionTable};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn start_board(kiwipete: bool, network: bool) -> Board {
    let mut board = if kiwipete { Board::from_fen(KIWIPETE) } else { Board::new() };
    if network {
        board.set_network(Arc::new(NnueNetwork::material()));
    }
    board
}

/// Play up to `count` random legal moves, returning what is needed to undo them.
fn random_walk(board: &mut Board, rng: &mut StdRng, count: usize) -> Vec<(Move, UnmakeInfo)> {
    let mut played = Vec::new();
    for _ in 0..count {
        let moves = board.generate_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves.as_slice()[rng.gen_range(0..moves.len())];
        let info = board.make_move(mv);
        played.push((mv, info));
    }
    played
}

fn quiet_move(from: usize, to: usize) -> Move {
    Move::quiet(Square::from_index(from), Square::from_index(to), Piece::Knight)
}

proptest! {
    /// make_move followed by unmake_move restores the position, its keys and
    /// the accumulators exactly.
    #[test]
    fn prop_make_unmake_restores_state(seed in any::<u64>(), num_moves in 1..=24usize, kiwipete in any::<bool>()) {
        let mut board = start_board(kiwipete, true);
        let mut rng = StdRng::seed_from_u64(seed);

        let initial_hash = board.hash();
        let initial_fen = board.to_fen();
        let initial_acc = board.accumulator().cloned();

        let mut played = random_walk(&mut board, &mut rng, num_moves);
        while let Some((mv, info)) = played.pop() {
            board.unmake_move(mv, info);
        }

        prop_assert_eq!(board.hash(), initial_hash);
        prop_assert_eq!(board.to_fen(), initial_fen);
        prop_assert!(board.accumulator().cloned() == initial_acc);
    }

    /// Incrementally updated keys always equal a from-scratch computation.
    #[test]
    fn prop_incremental_keys_match(seed in any::<u64>(), num_moves in 1..=40usize) {
        let mut board = Board::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..num_moves {
            if random_walk(&mut board, &mut rng, 1).is_empty() {
                break;
            }
            prop_assert_eq!(board.hash(), board.compute_hash());
            let (pawn, non_pawn, minor) = board.compute_sub_keys();
            prop_assert_eq!(board.pawn_key(), pawn);
            prop_assert_eq!(board.non_pawn_key(Color::White), non_pawn[0]);
            prop_assert_eq!(board.non_pawn_key(Color::Black), non_pawn[1]);
            prop_assert_eq!(board.minor_key(), minor);
        }
    }

    /// The incremental accumulator equals a fresh refresh of the same position.
    #[test]
    fn prop_accumulator_matches_refresh(seed in any::<u64>(), num_moves in 1..=30usize) {
        let mut board = start_board(false, true);
        let mut rng = StdRng::seed_from_u64(seed);
        let _ = random_walk(&mut board, &mut rng, num_moves);

        let mut fresh = Board::from_fen(&board.to_fen());
        fresh.set_network(Arc::new(NnueNetwork::material()));
        prop_assert!(board.accumulator() == fresh.accumulator());
        prop_assert_eq!(board.evaluate(), fresh.evaluate());
    }

    /// FEN round-trip preserves the position.
    #[test]
    fn prop_fen_roundtrip(seed in any::<u64>(), num_moves in 1..=30usize) {
        let mut board = Board::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let _ = random_walk(&mut board, &mut rng, num_moves);

        let fen = board.to_fen();
        let parsed = Board::try_from_fen(&fen).expect("own FEN parses");
        prop_assert_eq!(parsed.to_fen(), fen);
        prop_assert_eq!(parsed.hash(), board.hash());
    }

    /// No generated move leaves the mover's king attacked, and every one of
    /// them is pseudo-legal.
    #[test]
    fn prop_legal_moves_are_safe(seed in any::<u64>(), num_moves in 0..=30usize) {
        let mut board = start_board(true, false);
        let mut rng = StdRng::seed_from_u64(seed);
        let _ = random_walk(&mut board, &mut rng, num_moves);

        let mover = board.side_to_move();
        for mv in board.generate_moves().iter().copied() {
            prop_assert!(board.is_pseudo_legal(mv), "{} not pseudo-legal", mv);
            let info = board.make_move(mv);
            let king = board.pieces(mover, Piece::King).lsb();
            prop_assert!(!board.is_square_attacked(king, board.side_to_move()), "{} leaves the king attacked", mv);
            board.unmake_move(mv, info);
        }
    }

    /// Main, capture and continuation entries stay within their bound under
    /// any update sequence.
    #[test]
    fn prop_history_bounded(bonuses in prop::collection::vec(-40_000i32..40_000, 1..200)) {
        let mut history = HistoryTables::new();
        let mv = quiet_move(6, 21);
        let capture = Move::capture(Square::from_index(21), Square::from_index(36), Piece::Knight);
        let threats = Bitboard::from_square(Square::from_index(36));
        let prev = [
            ContKey::new(Color::Black, quiet_move(57, 42)),
            ContKey::new(Color::White, quiet_move(1, 18)),
        ];
        for bonus in bonuses {
            history.update_main(Color::White, mv, Bitboard::EMPTY, bonus);
            history.update_capture(Color::White, capture, Piece::Pawn, threats, bonus);
            history.update_capture(Color::White, capture, Piece::Pawn, Bitboard::EMPTY, -bonus);
            history.update_cont(&prev, Color::White, mv, bonus);

            prop_assert!(history.main_score(Color::White, mv, Bitboard::EMPTY).abs() <= HISTORY_MAX);
            for t in [threats, Bitboard::EMPTY] {
                let score = history.capture_score(Color::White, capture, Piece::Pawn, t);
                prop_assert!(score.abs() <= HISTORY_MAX);
            }
            for key in prev.iter().flatten() {
                prop_assert!(history.cont_score(*key, Color::White, mv).abs() <= HISTORY_MAX);
            }
            prop_assert!(history.cont_total(&prev, Color::White, mv).abs() <= 2 * HISTORY_MAX);
        }
    }

    /// Correction entries stay bounded and the corrected eval stays out of
    /// the mate band.
    #[test]
    fn prop_correction_bounded(diffs in prop::collection::vec(-5_000i32..5_000, 1..100), depth in 1..30i32) {
        let mut history = HistoryTables::new();
        let board = Board::new();
        let params = SearchParams::default();
        for diff in diffs {
            history.update_correction(&board, depth, diff);
            let (pawn, white, black, minor) = history.correction_entries(&board);
            for entry in [pawn, white, black, minor] {
                prop_assert!(entry.abs() <= CORRHIST_MAX);
            }
            let corrected = history.corrected_eval(&board, MATE_BOUND - 10, &params);
            prop_assert!(corrected < MATE_BOUND);
        }
    }

    /// A stored entry reads back unchanged, with mate scores rebased by ply.
    #[test]
    fn prop_tt_store_probe(
        hash in any::<u64>(),
        from in 0..64usize,
        to in 0..64usize,
        score in -(MATE_BOUND - 1)..MATE_BOUND,
        depth in 0..=255i32,
        bound_idx in 0..3usize,
        tt_pv in any::<bool>(),
        ply in 0..64usize,
    ) {
        prop_assume!(from != to);
        let tt = TranspositionTable::new(1);
        let mv = quiet_move(from, to);
        let bound = [Bound::Lower, Bound::Exact, Bound::Upper][bound_idx];

        tt.store(hash, mv, score, depth, bound, tt_pv, ply);
        let entry = tt.probe(hash, ply);
        prop_assert!(entry.hit(hash));
        prop_assert!(mv.matches(entry.mv));
        prop_assert_eq!(entry.score, score);
        prop_assert_eq!(i32::from(entry.depth), depth);
        prop_assert_eq!(entry.bound, bound);
        prop_assert_eq!(entry.tt_pv, tt_pv);

        // A mate found `plies` below the storing node keeps its distance
        let plies = 3;
        tt.store(hash, mv, MATE - (ply as i32 + plies), depth, bound, tt_pv, ply);
        prop_assert_eq!(tt.probe(hash, ply + 2).score, MATE - (ply as i32 + 2 + plies));
    }
}
