//! Move ordering for the main search and quiescence.

use crate::board::{Bitboard, Board, Move, MoveList, Piece, ScoredMoveList};

use super::constants::{
    BAD_CAPTURE_PENALTY, GOOD_CAPTURE_BONUS, KILLER_SCORE, QS_QUIET_SCORE, QUIET_OFFSET,
    TT_MOVE_SCORE,
};
use super::history::{ContKey, HistoryTables};
use super::params::SearchParams;

/// Everything the scorer needs to know about the node.
pub(crate) struct OrderingContext<'a> {
    pub history: &'a HistoryTables,
    pub params: &'a SearchParams,
    pub see_values: &'a [i32; 6],
    /// Squares attacked by the opponent
    pub threats: Bitboard,
    pub tt_move: u16,
    pub killer: Move,
    pub cont: [Option<ContKey>; 2],
}

/// Victim value times 100 minus attacker value, both in SEE units.
#[inline]
fn mvv_lva(see_values: &[i32; 6], victim: Piece, attacker: Piece) -> i32 {
    see_values[victim.index()] * 100 - see_values[attacker.index()]
}

fn capture_score(board: &Board, mv: Move, ctx: &OrderingContext<'_>, see_threshold: i32, good: i32) -> i32 {
    let side = board.side_to_move();
    let victim = board.captured_piece(mv).unwrap_or(Piece::Pawn);
    let see_adjust = if board.see(mv, see_threshold, ctx.see_values) {
        good
    } else {
        BAD_CAPTURE_PENALTY
    };
    mvv_lva(ctx.see_values, victim, mv.piece())
        + ctx.history.capture_score(side, mv, victim, ctx.threats)
        + see_adjust
}

/// Score pseudo-legal moves for the main search: hash move, captures by
/// MVV-LVA, capture history and SEE, then the killer, then quiets by history.
pub(crate) fn score_moves(board: &Board, moves: &MoveList, ctx: &OrderingContext<'_>) -> ScoredMoveList {
    let side = board.side_to_move();
    let mut scored = ScoredMoveList::new();
    for &mv in moves {
        let score = if mv.matches(ctx.tt_move) {
            TT_MOVE_SCORE
        } else if mv.is_capture() {
            capture_score(board, mv, ctx, ctx.params.see_ordering_pvs, GOOD_CAPTURE_BONUS)
        } else if mv == ctx.killer {
            KILLER_SCORE
        } else {
            ctx.history.main_score(side, mv, ctx.threats) + ctx.history.cont_total(&ctx.cont, side, mv)
                - QUIET_OFFSET
        };
        scored.push(mv, score);
    }
    scored
}

/// Score noisy moves for quiescence. Quiet promotions go last.
pub(crate) fn score_qs_moves(board: &Board, moves: &MoveList, ctx: &OrderingContext<'_>) -> ScoredMoveList {
    let mut scored = ScoredMoveList::new();
    for &mv in moves {
        let score = if mv.matches(ctx.tt_move) {
            TT_MOVE_SCORE
        } else if mv.is_capture() {
            capture_score(board, mv, ctx, ctx.params.see_ordering_qs, 0)
        } else {
            QS_QUIET_SCORE
        };
        scored.push(mv, score);
    }
    scored.sort_by_score_desc();
    scored
}
