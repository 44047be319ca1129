//! Principal variation search.

use crate::board::{Board, Move, MoveList, MAX_PLY};
use crate::tt::Bound;

use super::constants::{is_mate_score, INFINITE, LMR_TABLE_DEPTH, LMR_TABLE_MOVES, MATE, MATE_BOUND, MIN_LMR_DEPTH};
use super::history::scaled_bonus;
use super::move_order::{score_moves, OrderingContext};
use super::SearchWorker;

/// Deepest whole-node futility pruning applies
const RFP_MAX_DEPTH: i32 = 6;
/// Cap on the eval-based part of the null move reduction
const MAX_NMP_EVAL_R: i32 = 3;
/// Null move results at this depth and below are trusted without verification
const NMP_VERIFY_DEPTH: i32 = 14;
/// History pruning applies at this depth and below
const HP_MAX_DEPTH: i32 = 5;
/// Singular extension needs at least this depth
const SE_MIN_DEPTH: i32 = 7;
/// A singular search failing this far below its beta rewards the TT move
const SE_HISTORY_MARGIN: i32 = 20;

/// Whether a TT entry with `bound` and `score` settles the window.
#[inline]
pub(crate) fn bound_cuts(bound: Bound, score: i32, alpha: i32, beta: i32) -> bool {
    match bound {
        Bound::Exact => true,
        Bound::Lower => score >= beta,
        Bound::Upper => score <= alpha,
        Bound::None => false,
    }
}

impl SearchWorker {
    /// Fail-soft negamax search of `board` to `depth` plies.
    ///
    /// `excluded` is skipped in the move loop; a non-null value marks a
    /// singular verification search.
    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    pub(crate) fn alpha_beta(
        &mut self,
        board: &mut Board,
        mut depth: i32,
        mut alpha: i32,
        beta: i32,
        cut_node: bool,
        ply: usize,
        excluded: Move,
    ) -> i32 {
        if self.should_stop(ply) {
            return 0;
        }

        let pv_node = beta - alpha > 1;
        let root = ply == 0;
        let singular_search = !excluded.is_null();

        self.pv.clear_ply(ply);
        self.seldepth = self.seldepth.max(ply);

        if !root && board.is_draw() {
            return 0;
        }

        let in_check = board.in_check();
        if in_check {
            depth += 1;
        }
        if depth <= 0 || ply >= MAX_PLY - 2 {
            return self.quiescence(board, alpha, beta, ply);
        }

        // Transposition table
        let hash = board.hash();
        let entry = self.tt.probe(hash, ply);
        let tt_hit = entry.hit(hash);
        let tt_move = if tt_hit { entry.mv } else { 0 };
        let tt_depth = i32::from(entry.depth);
        let tt_pv = pv_node || (tt_hit && entry.tt_pv);

        if tt_hit
            && !singular_search
            && !pv_node
            && !root
            && tt_depth >= depth
            && bound_cuts(entry.bound, entry.score, alpha, beta)
        {
            return entry.score;
        }

        // Internal iterative reduction
        if !singular_search && depth >= 4 && (pv_node || cut_node) && !tt_hit {
            depth -= 1;
        }

        // Static evaluation
        let raw_eval = board.evaluate();
        let static_eval = self.history.corrected_eval(board, raw_eval, &self.params);
        let mut eval = static_eval;
        if tt_hit
            && !singular_search
            && !in_check
            && match entry.bound {
                Bound::Exact => true,
                Bound::Lower => entry.score >= static_eval,
                Bound::Upper => entry.score <= static_eval,
                Bound::None => false,
            }
        {
            eval = entry.score;
        }

        self.stack[ply].static_eval = static_eval;
        self.stack[ply].in_check = in_check;
        self.stack[ply].reduction = 0;

        let improving = !in_check && ply >= 2 && static_eval > self.stack[ply - 2].static_eval;
        let can_prune = !in_check && !pv_node && !singular_search;
        let not_mated = beta >= -MATE_BOUND;

        if can_prune && not_mated {
            if let Some(score) = self.prune_node(board, &mut depth, alpha, beta, eval, static_eval, improving, cut_node, ply) {
                return score;
            }
        }

        // Move loop
        let side = board.side_to_move();
        let threats = board.attacked_by(side.opponent());
        let cont = self.stack.cont_keys(ply);
        let killer = self.history.killer(ply);

        let mut moves = MoveList::new();
        board.generate_pseudo_legal(&mut moves);
        let mut scored = {
            let ctx = OrderingContext {
                history: &self.history,
                params: &self.params,
                see_values: &self.see_values,
                threats,
                tt_move,
                killer,
                cont,
            };
            score_moves(board, &moves, &ctx)
        };

        let mut searched_quiets = MoveList::new();
        let mut searched_noisy = MoveList::new();
        let mut searched = 0usize;
        let mut quiets_tried = 0usize;
        let mut best_score = -INFINITE;
        let mut best_move = Move::NULL;
        let mut tt_move_seen = Move::NULL;
        let mut bound = Bound::Upper;
        let mut skip_quiets = false;

        let p = &self.params;
        let quiet_see_margin = p.pvs_see_quiet_base - p.pvs_see_quiet_mult * depth;
        let noisy_see_margin = p.pvs_see_noisy_base - p.pvs_see_noisy_mult * depth * depth;
        let lmp_threshold = ((p.lmp_base + p.lmp_mult * depth * depth) / 100).max(0) as usize;
        let hp_margin = p.hp_base - p.hp_mult * depth;
        let material = board.material_eval();

        self.stack[ply].snapshot(board);
        self.stack[ply].mover = side;

        let mut idx = 0;
        while let Some(candidate) = scored.pick_best(idx) {
            idx += 1;
            let mv = candidate.mv;
            if mv == excluded {
                continue;
            }
            if mv.matches(tt_move) {
                tt_move_seen = mv;
            }

            let is_quiet = !mv.is_capture();
            if skip_quiets && is_quiet {
                continue;
            }

            let history_score =
                self.history.main_score(side, mv, threats) + self.history.cont_total(&cont, side, mv);

            if best_score > -MATE_BOUND && searched >= 1 && !root {
                if searched >= lmp_threshold {
                    skip_quiets = true;
                    continue;
                }
                if quiets_tried > 1 && depth <= HP_MAX_DEPTH && history_score < hp_margin {
                    continue;
                }
                let see_threshold = if is_quiet {
                    quiet_see_margin - history_score / self.params.pvs_see_hist_div.max(1)
                } else {
                    noisy_see_margin
                };
                if !board.see(mv, see_threshold, &self.see_values) {
                    continue;
                }
            }

            let mut info = board.make_move(mv);
            if !board.is_legal_after_move(mv) {
                self.unmake(board, mv, info, ply);
                continue;
            }
            self.tt.prefetch(board.hash());

            if is_quiet {
                searched_quiets.push(mv);
                quiets_tried += 1;
            } else {
                searched_noisy.push(mv);
            }
            searched += 1;
            self.nodes += 1;
            self.stack[ply].mv = mv;

            // Singular extension
            let mut extension = 0;
            if tt_hit
                && !root
                && depth >= SE_MIN_DEPTH
                && mv.matches(tt_move)
                && !singular_search
                && tt_depth >= depth - 3
                && entry.bound != Bound::Upper
                && !is_mate_score(entry.score)
            {
                self.unmake(board, mv, info, ply);

                let s_beta = entry.score - depth * 2;
                let s_depth = (depth - 1) / 2;
                let s_score = self.alpha_beta(board, s_depth, s_beta - 1, s_beta, cut_node, ply, mv);

                if s_score < s_beta - SE_HISTORY_MARGIN {
                    let bonus = scaled_bonus(depth, self.params.se_hist_base, self.params.se_hist_mult, self.params.se_hist_max);
                    if is_quiet {
                        self.history.update_main(side, mv, threats, bonus);
                    } else if let Some(victim) = board.captured_piece(mv) {
                        self.history.update_capture(side, mv, victim, threats, bonus);
                    }
                }

                if s_score < s_beta {
                    extension = 1;
                    if !pv_node && s_score <= s_beta - self.params.double_ext_margin {
                        extension = 2;
                    }
                } else if s_beta >= beta {
                    return s_beta;
                } else if cut_node {
                    extension = -2;
                } else if entry.score >= beta {
                    extension = -1;
                }

                // The verification search reused this ply's slots
                self.stack[ply].snapshot(board);
                self.stack[ply].mover = side;
                self.stack[ply].mv = mv;
                info = board.make_move(mv);
            }

            let nodes_before = self.nodes;
            let do_lmr = depth > MIN_LMR_DEPTH && searched > 1 + usize::from(root) * 2 && !(pv_node && !is_quiet);

            let mut reduction = 0;
            if do_lmr {
                reduction = self.lmr[(depth as usize).min(LMR_TABLE_DEPTH - 1)][searched.min(LMR_TABLE_MOVES - 1)];
                let p = &self.params;
                let mut adjust = 0;
                if !pv_node && quiets_tried >= 4 {
                    adjust += p.lmr_pv_add;
                }
                if is_quiet {
                    adjust -= (history_score / p.hist_lmr_div.max(1)).clamp(-2, 2) * 1024;
                    adjust += p.lmr_quiet_add;
                }
                if cut_node {
                    adjust += p.lmr_cutnode_add;
                }
                if tt_pv {
                    adjust -= p.lmr_ttpv_sub;
                }
                if improving {
                    adjust -= p.lmr_improving_sub;
                }
                if (raw_eval - static_eval).abs() > p.corrplexity_threshold {
                    adjust -= p.lmr_corrplexity_sub;
                }
                if mv == killer {
                    adjust -= p.lmr_killer_sub;
                }
                if (static_eval - material).abs() > p.evalplexity_threshold {
                    adjust -= p.lmr_evalplexity_sub;
                }
                reduction += adjust / 1024;
            }

            self.stack[ply].reduction = reduction;
            let reduction = reduction.clamp(0, (depth - 2).max(0));
            let reduced = reduction > 0;
            let mut child_depth = depth + extension - 1;

            let mut score = -INFINITE;
            if do_lmr {
                score = -self.alpha_beta(board, child_depth - reduction, -alpha - 1, -alpha, true, ply + 1, Move::NULL);
                if score > alpha && reduced {
                    let deeper = score > best_score + self.params.do_deeper_margin + depth * child_depth;
                    let shallower = score < best_score + child_depth;
                    child_depth += i32::from(deeper) - i32::from(shallower);
                    score = -self.alpha_beta(board, child_depth, -alpha - 1, -alpha, !cut_node, ply + 1, Move::NULL);
                }
            } else if !pv_node || searched > 1 {
                score = -self.alpha_beta(board, child_depth, -alpha - 1, -alpha, !cut_node, ply + 1, Move::NULL);
            }
            if pv_node && (searched == 1 || score > alpha) {
                score = -self.alpha_beta(board, child_depth, -beta, -alpha, false, ply + 1, Move::NULL);
            }

            if root {
                self.root_nodes[mv.from().index()][mv.to().index()] += self.nodes - nodes_before;
            }

            self.unmake(board, mv, info, ply);
            if self.stopped() {
                return 0;
            }

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                bound = Bound::Exact;
                alpha = score;
                best_move = mv;
                if pv_node {
                    self.pv.update(ply, mv);
                }
            }

            if alpha >= beta {
                bound = Bound::Lower;
                self.reward_cutoff(board, mv, depth, ply, threats, &searched_quiets, &searched_noisy);
                break;
            }
        }

        if searched == 0 {
            return if singular_search {
                alpha
            } else if in_check {
                -MATE + ply as i32
            } else {
                0
            };
        }

        if bound == Bound::Upper && tt_hit {
            best_move = tt_move_seen;
        }

        if !singular_search
            && !in_check
            && (best_move.is_null() || best_move.is_quiet())
            && !(bound == Bound::Lower && best_score <= static_eval)
            && !(bound == Bound::Upper && best_score >= static_eval)
        {
            self.history.update_correction(board, depth, best_score - static_eval);
        }

        if !singular_search && !self.stopped() {
            self.tt.store(hash, best_move, best_score, depth, bound, tt_pv, ply);
        }

        best_score
    }

    /// Hindsight extension, reverse futility pruning, razoring and null move
    /// pruning. Returns a score when the node can be cut.
    #[allow(clippy::too_many_arguments)]
    fn prune_node(
        &mut self,
        board: &mut Board,
        depth: &mut i32,
        alpha: i32,
        beta: i32,
        eval: i32,
        static_eval: i32,
        improving: bool,
        cut_node: bool,
        ply: usize,
    ) -> Option<i32> {
        let root = ply == 0;

        if !root {
            let parent = &self.stack[ply - 1];
            if parent.reduction >= 3 && !parent.in_check && static_eval + parent.static_eval < 0 {
                *depth += 1;
            }
        }
        let depth = *depth;
        let p = self.params.clone();

        // Reverse futility pruning
        if depth <= RFP_MAX_DEPTH {
            let margin = (p.rfp_mult - i32::from(improving) * p.rfp_improving_sub) * depth + p.rfp_base;
            if eval - margin >= beta {
                return Some((eval + beta) / 2);
            }
        }

        // Razoring
        if depth <= 3 && eval + p.razor_mult * depth + p.razor_base <= alpha {
            let score = self.quiescence(board, alpha, alpha + 1, ply);
            if score <= alpha {
                return Some(score);
            }
        }

        // Null move pruning
        let side = board.side_to_move();
        if depth >= 2
            && !root
            && eval >= beta + p.nmp_offset
            && ply >= self.min_nmp_ply
            && !board.only_king_and_pawns(side)
        {
            let reduction = 3 + depth / 3 + ((eval - beta) / p.nmp_div.max(1)).min(MAX_NMP_EVAL_R);
            let saved_nmp_ply = self.min_nmp_ply;

            self.stack[ply].mv = Move::NULL;
            self.stack[ply].mover = side;
            let info = board.make_null_move();
            self.tt.prefetch(board.hash());
            self.min_nmp_ply = ply + 2;
            let score = -self.alpha_beta(board, depth - reduction, -beta, -beta + 1, !cut_node, ply + 1, Move::NULL);
            self.min_nmp_ply = saved_nmp_ply;
            board.unmake_null_move(info);

            if self.stopped() {
                return Some(0);
            }

            if score >= beta {
                if depth <= NMP_VERIFY_DEPTH || saved_nmp_ply > 0 {
                    return Some(if is_mate_score(score) { beta } else { score });
                }

                self.min_nmp_ply = ply + ((depth - reduction) * 3 / 4).max(0) as usize;
                let verified = self.alpha_beta(board, depth - reduction, beta - 1, beta, false, ply, Move::NULL);
                self.min_nmp_ply = saved_nmp_ply;
                if verified >= beta {
                    return Some(verified);
                }
            }
        }

        None
    }

    /// Take back `mv`, restoring the accumulators from this ply's snapshot.
    #[inline]
    pub(crate) fn unmake(&mut self, board: &mut Board, mv: Move, info: crate::board::UnmakeInfo, ply: usize) {
        match self.stack[ply].acc.as_ref() {
            Some(snapshot) => board.unmake_move_restoring(mv, info, snapshot),
            None => board.unmake_move(mv, info),
        }
    }

    /// History updates after `mv` produced a beta cutoff.
    #[allow(clippy::too_many_arguments)]
    fn reward_cutoff(
        &mut self,
        board: &Board,
        mv: Move,
        depth: i32,
        ply: usize,
        threats: crate::board::Bitboard,
        searched_quiets: &MoveList,
        searched_noisy: &MoveList,
    ) {
        let side = board.side_to_move();
        let p = &self.params;
        let capt_bonus = scaled_bonus(depth, p.capthist_bonus_base, p.capthist_bonus_mult, p.capthist_bonus_max);
        let capt_malus = scaled_bonus(depth, p.capthist_malus_base, p.capthist_malus_mult, p.capthist_malus_max);

        if !mv.is_capture() {
            let main_bonus = scaled_bonus(depth, p.mainhist_bonus_base, p.mainhist_bonus_mult, p.mainhist_bonus_max);
            let main_malus = scaled_bonus(depth, p.mainhist_malus_base, p.mainhist_malus_mult, p.mainhist_malus_max);
            let cont_bonus = scaled_bonus(depth, p.conthist_bonus_base, p.conthist_bonus_mult, p.conthist_bonus_max);
            let cont_malus = scaled_bonus(depth, p.conthist_malus_base, p.conthist_malus_mult, p.conthist_malus_max);
            let cont = self.stack.cont_keys(ply);

            self.history.set_killer(ply, mv);
            self.history.update_main(side, mv, threats, main_bonus);
            self.history.update_cont(&cont, side, mv, cont_bonus);
            for &quiet in searched_quiets.iter().filter(|&&q| q != mv) {
                self.history.update_main(side, quiet, threats, -main_malus);
                self.history.update_cont(&cont, side, quiet, -cont_malus);
            }
        } else if let Some(victim) = board.captured_piece(mv) {
            self.history.update_capture(side, mv, victim, threats, capt_bonus);
        }

        for &noisy in searched_noisy.iter().filter(|&&n| n != mv) {
            if let Some(victim) = board.captured_piece(noisy) {
                self.history.update_capture(side, noisy, victim, threats, -capt_malus);
            }
        }
    }
}
