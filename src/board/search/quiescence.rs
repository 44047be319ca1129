//! Quiescence search: captures and promotions until the position is quiet.

use crate::board::{Board, Move, MoveList, MAX_PLY};
use crate::tt::Bound;

use super::move_order::{score_qs_moves, OrderingContext};
use super::negamax::bound_cuts;
use super::SearchWorker;

/// Margin added to the stand-pat score for capture futility
const QS_FUTILITY_MARGIN: i32 = 100;

impl SearchWorker {
    pub(crate) fn quiescence(&mut self, board: &mut Board, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.should_stop(ply) {
            return 0;
        }

        let raw_eval = board.evaluate();
        let static_eval = self.history.corrected_eval(board, raw_eval, &self.params);
        self.stack[ply].static_eval = static_eval;
        self.seldepth = self.seldepth.max(ply);

        let hash = board.hash();
        let entry = self.tt.probe(hash, ply);
        let tt_hit = entry.hit(hash);
        if tt_hit && bound_cuts(entry.bound, entry.score, alpha, beta) {
            return entry.score;
        }

        if ply >= MAX_PLY - 2 {
            return static_eval;
        }

        let mut best_score = static_eval;
        if best_score >= beta {
            return best_score;
        }
        if best_score > alpha {
            alpha = best_score;
        }

        let side = board.side_to_move();
        let mut moves = MoveList::new();
        board.generate_noisy(&mut moves);
        let scored = {
            let ctx = OrderingContext {
                history: &self.history,
                params: &self.params,
                see_values: &self.see_values,
                threats: board.attacked_by(side.opponent()),
                tt_move: if tt_hit { entry.mv } else { 0 },
                killer: Move::NULL,
                cont: [None, None],
            };
            score_qs_moves(board, &moves, &ctx)
        };

        self.stack[ply].snapshot(board);
        self.stack[ply].mover = side;

        let futility = best_score + QS_FUTILITY_MARGIN;
        let mut best_move = Move::NULL;
        let mut bound = Bound::Upper;
        let mut searched = 0usize;

        for candidate in scored.as_slice() {
            let mv = candidate.mv;

            if mv.is_capture() && futility <= alpha && !board.see(mv, 1, &self.see_values) {
                best_score = best_score.max(futility);
                continue;
            }
            if !board.see(mv, self.params.qs_see_margin, &self.see_values) {
                continue;
            }

            let info = board.make_move(mv);
            if !board.is_legal_after_move(mv) {
                self.unmake(board, mv, info, ply);
                continue;
            }
            searched += 1;
            self.nodes += 1;
            self.stack[ply].mv = mv;

            let score = -self.quiescence(board, -beta, -alpha, ply + 1);
            self.unmake(board, mv, info, ply);

            if self.stopped() {
                return 0;
            }

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
                best_move = mv;
                bound = Bound::Exact;
            }
            if alpha >= beta {
                bound = Bound::Lower;
                break;
            }
        }

        if searched == 0 {
            return static_eval;
        }

        // Only fill empty slots; deeper main-search results stay
        if entry.bound == Bound::None && !self.stopped() {
            self.tt.store(hash, best_move, best_score, 0, bound, false, ply);
        }

        best_score
    }
}
