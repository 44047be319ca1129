//! Search internals: quiescence, alpha-beta at the root, history learning
//! and the root entry left in the transposition table.

use std::sync::Arc;

use crate::board::search::{SearchLimits, SearchWorker, INFINITE, MATE};
use crate::board::{search_depth, Board, Move};
use crate::tt::{Bound, TranspositionTable};

fn worker() -> SearchWorker {
    SearchWorker::new(Arc::new(TranspositionTable::new(4)))
}

#[test]
fn quiescence_without_captures_stands_pat() {
    let mut board = Board::new();
    let mut worker = worker();
    let score = worker.quiescence(&mut board, -INFINITE, INFINITE, 0);
    assert_eq!(score, board.evaluate());
}

#[test]
fn quiescence_wins_hanging_queen() {
    let mut board = Board::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1");
    let mut worker = worker();
    let stand_pat = board.evaluate();
    let score = worker.quiescence(&mut board, -INFINITE, INFINITE, 0);
    assert_eq!(score, stand_pat + 900);
}

#[test]
fn quiescence_skips_losing_capture() {
    // Qxd5 loses the queen to cxd5
    let mut board = Board::from_fen("4k3/8/2p5/3p4/8/8/8/3QK3 w - - 0 1");
    let mut worker = worker();
    let score = worker.quiescence(&mut board, -INFINITE, INFINITE, 0);
    assert_eq!(score, board.evaluate());
}

#[test]
fn quiescence_fails_high_on_stand_pat() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
    let mut worker = worker();
    let score = worker.quiescence(&mut board, -INFINITE, 100, 0);
    assert!(score >= 100);
}

#[test]
fn alpha_beta_scores_mate_in_one_from_root() {
    let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1");
    let mut worker = worker();
    let score = worker.alpha_beta(&mut board, 2, -INFINITE, INFINITE, false, 0, Move::NULL);
    assert_eq!(score, MATE - 1);
}

#[test]
fn alpha_beta_scores_checkmated_root() {
    let mut board = Board::from_fen("7k/7Q/7K/8/8/8/8/8 b - - 0 1");
    let mut worker = worker();
    let score = worker.alpha_beta(&mut board, 3, -INFINITE, INFINITE, false, 0, Move::NULL);
    assert_eq!(score, -MATE);
}

#[test]
fn search_learns_killers_and_clear_forgets_them() {
    let mut board = Board::new();
    let mut worker = worker();
    let _ = worker.search(&mut board, &SearchLimits::depth(6));
    assert!((1..6).any(|ply| !worker.history().killer(ply).is_null()));

    worker.clear();
    assert!((0..64).all(|ply| worker.history().killer(ply).is_null()));
}

#[test]
fn root_entry_matches_outcome() {
    let tt = Arc::new(TranspositionTable::new(4));
    let mut board = Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4");
    let outcome = search_depth(&mut board, Arc::clone(&tt), 5);

    let entry = tt.probe(board.hash(), 0);
    assert!(entry.hit(board.hash()));
    assert_eq!(entry.bound, Bound::Exact);
    // A fail-high re-search may finish the iteration at reduced depth
    assert!((1..=5).contains(&i32::from(entry.depth)));
    assert_eq!(entry.score, outcome.score);
    assert!(outcome.best_move.is_some_and(|mv| mv.matches(entry.mv)));
}

#[test]
fn stop_before_first_iteration_is_reported_as_cancelled() {
    let mut board = Board::new();
    let mut worker = worker();
    worker.signals().stop_all();
    let outcome = worker.iterative_deepening(&mut board, &SearchLimits::default());
    assert!(outcome.cancelled, "depth {} cancelled {}", outcome.depth, outcome.cancelled);
    assert_eq!(outcome.depth, 0);
    let mv = outcome.best_move.expect("fallback move");
    assert!(board.generate_moves().contains(mv));
}
