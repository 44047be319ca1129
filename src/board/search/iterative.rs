//! Iterative deepening with aspiration windows and node-fraction time
//! management.

use std::time::{Duration, Instant};

use log::debug;

use crate::board::{Board, Move};

use super::constants::{ASPIRATION_MAX_DELTA, INFINITE, NODE_TM_MIN_DEPTH};
use super::log::SearchInfo;
use super::{SearchLimits, SearchOutcome, SearchWorker};

impl SearchWorker {
    /// Deepen one ply at a time until a limit or a stop request.
    ///
    /// Depth 1 ignores the time and node limits but still honours a stop
    /// request. The result describes the last completed iteration;
    /// `cancelled` is set whenever an iteration was cut short, including the
    /// first one, in which case the move is only the first legal move.
    pub(crate) fn iterative_deepening(&mut self, board: &mut Board, limits: &SearchLimits) -> SearchOutcome {
        self.start = Instant::now();
        self.nodes = 0;
        self.min_nmp_ply = 0;
        self.stack.reset();
        self.pv.clear();

        let soft_time = limits.soft();
        let hard_time = limits.hard();
        let max_depth = limits.max_depth();

        let mut best_move: Option<Move> = None;
        let mut best_score = 0;
        let mut completed_depth = 0;
        let mut best_pv = Vec::new();
        let mut cancelled = false;
        let mut score = 0;

        for depth in 1..=max_depth {
            self.pv.clear();
            for row in self.root_nodes.iter_mut() {
                row.fill(0);
            }
            self.seldepth = 0;
            self.stack.reset();
            let iteration_start_nodes = self.nodes;

            // Limits are enforced inside the tree from depth 2 on
            if depth == 1 {
                self.hard_time = None;
                self.node_limit = None;
            } else {
                self.hard_time = hard_time;
                self.node_limit = limits.nodes;
            }

            let mut delta = self.params.asp_delta;
            let mut alpha = (score - delta).max(-INFINITE);
            let mut beta = (score + delta).min(INFINITE);
            if depth == 1 {
                alpha = -INFINITE;
                beta = INFINITE;
            }
            let mut asp_depth = depth;

            loop {
                let out_of_time = depth != 1 && hard_time.is_some_and(|limit| self.start.elapsed() > limit);
                if out_of_time || self.stopped() {
                    if self.is_main() {
                        self.signals.stop_all();
                    }
                    break;
                }

                score = self.alpha_beta(board, asp_depth.max(1), alpha, beta, false, 0, Move::NULL);
                if self.stopped() {
                    break;
                }

                delta += delta;
                if score <= alpha {
                    alpha = (score - delta).max(-INFINITE);
                    asp_depth = depth;
                } else if score >= beta {
                    beta = (score + delta).min(INFINITE);
                    asp_depth = (asp_depth - 1).max(depth - 5);
                } else {
                    break;
                }
                if delta >= ASPIRATION_MAX_DELTA {
                    alpha = -INFINITE;
                    beta = INFINITE;
                }
            }

            let interrupted = self.stopped();
            if interrupted {
                cancelled = true;
            } else if let Some(mv) = self.pv.best_move() {
                best_move = Some(mv);
                best_score = score;
                completed_depth = depth;
                best_pv = self.pv.root_line().to_vec();
                cancelled = false;
                self.report(depth, score);
            }

            if interrupted {
                break;
            }

            if (depth != 1 && hard_time.is_some_and(|limit| self.start.elapsed() > limit))
                || limits.nodes.is_some_and(|limit| self.nodes >= limit)
            {
                if self.is_main() {
                    self.signals.stop_all();
                }
                break;
            }

            if let (Some(soft), Some(_)) = (soft_time, hard_time) {
                let scale = self.node_time_scale(depth, best_move, iteration_start_nodes);
                if self.start.elapsed() > soft.mul_f64(scale) {
                    break;
                }
            }
        }

        if best_move.is_none() {
            // Stopped before the first iteration finished
            best_move = board.generate_moves().iter().next().copied();
            debug!("worker {} fell back to the first legal move", self.id);
        }

        self.signals.publish_nodes(self.id, self.nodes);
        SearchOutcome {
            best_move,
            score: best_score,
            depth: completed_depth,
            nodes: self.nodes,
            pv: best_pv,
            cancelled,
        }
    }

    /// Soft limit multiplier from the share of the last iteration spent on
    /// the best root move: a dominant move lets the search stop early.
    fn node_time_scale(&self, depth: i32, best_move: Option<Move>, iteration_start_nodes: u64) -> f64 {
        let iteration_nodes = self.nodes - iteration_start_nodes;
        match best_move {
            Some(mv) if depth >= NODE_TM_MIN_DEPTH && iteration_nodes > 0 => {
                let best_nodes = self.root_nodes[mv.from().index()][mv.to().index()];
                1.5 - best_nodes as f64 / iteration_nodes as f64
            }
            _ => 1.0,
        }
    }

    /// Publish an iteration result through the logger. Only the main worker
    /// reports.
    fn report(&self, depth: i32, score: i32) {
        self.signals.publish_nodes(self.id, self.nodes);
        if !self.is_main() {
            return;
        }
        let elapsed = self.start.elapsed();
        let nodes = self.signals.total_nodes();
        let info = SearchInfo {
            depth,
            seldepth: self.seldepth,
            score,
            time_ms: elapsed.as_millis(),
            nodes,
            nps: nps(nodes, elapsed),
            hashfull: self.tt.hashfull(),
            pv: self.pv.root_line().to_vec(),
        };
        self.logger.info(&info);
    }
}

fn nps(nodes: u64, elapsed: Duration) -> u64 {
    let micros = elapsed.as_micros().max(1);
    (u128::from(nodes) * 1_000_000 / micros) as u64
}
