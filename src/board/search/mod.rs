//! Search module implementing negamax alpha-beta with iterative deepening.
//!
//! Features:
//! - Iterative deepening with aspiration windows and node-fraction time management
//! - Principal variation search with late move reductions
//! - Reverse futility pruning, razoring and verified null move pruning
//! - Late move, history and SEE pruning in the move loop
//! - Check, hindsight, singular and double extensions
//! - Quiescence search with SEE and futility filtering
//! - Quiet, capture, continuation and correction histories
//! - Lazy SMP worker pool sharing one transposition table

mod constants;
mod history;
mod iterative;
pub mod log;
mod move_order;
mod negamax;
mod params;
mod quiescence;
pub mod smp;
mod stack;
mod time;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::tt::TranspositionTable;

use super::{Board, Move};

pub use constants::{is_mate_score, INFINITE, MATE, MATE_BOUND};
pub use history::{ContKey, HistoryTables, CORRHIST_MAX, HISTORY_MAX};
pub use log::{SearchInfo, SearchLogger, SilentLogger, StdoutLogger};
pub use params::{SearchParams, Tunable};
pub use smp::WorkerPool;
pub use time::{time_budget, TimeControl};

use constants::{build_lmr_table, LmrTable};
use stack::{PvTable, SearchStack};

/// Limits for one search. `None` means unlimited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    /// Stop starting new iterations after this long
    pub soft_time: Option<Duration>,
    /// Abort the search after this long
    pub hard_time: Option<Duration>,
    pub nodes: Option<u64>,
    /// Ignore time until stopped
    pub infinite: bool,
}

impl SearchLimits {
    #[must_use]
    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            depth: Some(depth),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn movetime(time: Duration) -> Self {
        SearchLimits {
            hard_time: Some(time),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn nodes(nodes: u64) -> Self {
        SearchLimits {
            nodes: Some(nodes),
            ..Default::default()
        }
    }

    /// Soft and hard limits from the remaining clock time and increment.
    #[must_use]
    pub fn from_clock(remaining: Duration, increment: Duration) -> Self {
        let (soft, hard) = time_budget(remaining, increment);
        SearchLimits {
            soft_time: Some(soft),
            hard_time: Some(hard),
            ..Default::default()
        }
    }

    /// Limits for a helper worker: the depth cap only.
    #[must_use]
    pub(crate) fn for_helper(&self) -> Self {
        SearchLimits {
            depth: self.depth,
            ..Default::default()
        }
    }

    pub(crate) fn max_depth(&self) -> i32 {
        self.depth
            .unwrap_or(crate::board::MAX_PLY as i32 - 1)
            .clamp(1, crate::board::MAX_PLY as i32 - 1)
    }

    fn hard(&self) -> Option<Duration> {
        if self.infinite {
            None
        } else {
            self.hard_time
        }
    }

    fn soft(&self) -> Option<Duration> {
        if self.infinite {
            None
        } else {
            self.soft_time
        }
    }
}

/// Result of iterative deepening.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Best move of the last completed iteration, `None` without legal moves
    pub best_move: Option<Move>,
    pub score: i32,
    /// Last completed depth
    pub depth: i32,
    pub nodes: u64,
    /// Principal variation of the last completed iteration
    pub pv: Vec<Move>,
    /// The final iteration was interrupted by a limit or a stop request
    pub cancelled: bool,
}

/// Stop flags and node counters of every worker in a pool.
#[derive(Debug)]
pub struct SearchSignals {
    workers: Box<[WorkerSignal]>,
}

#[derive(Debug, Default)]
struct WorkerSignal {
    stop: AtomicBool,
    nodes: AtomicU64,
}

impl SearchSignals {
    #[must_use]
    pub fn new(workers: usize) -> Arc<Self> {
        Arc::new(SearchSignals {
            workers: (0..workers.max(1)).map(|_| WorkerSignal::default()).collect(),
        })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Ask every worker to stop.
    pub fn stop_all(&self) {
        for worker in self.workers.iter() {
            worker.stop.store(true, Ordering::Relaxed);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_stopped(&self, id: usize) -> bool {
        self.workers[id].stop.load(Ordering::Relaxed)
    }

    #[inline]
    fn stop(&self, id: usize) {
        self.workers[id].stop.store(true, Ordering::Relaxed);
    }

    fn reset(&self, id: usize) {
        self.workers[id].stop.store(false, Ordering::Relaxed);
        self.workers[id].nodes.store(0, Ordering::Relaxed);
    }

    #[inline]
    fn publish_nodes(&self, id: usize, nodes: u64) {
        self.workers[id].nodes.store(nodes, Ordering::Relaxed);
    }

    /// Nodes searched by all workers in the current search.
    #[must_use]
    pub fn total_nodes(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| w.nodes.load(Ordering::Relaxed))
            .sum()
    }
}

/// The private state of one search thread: histories, search stack, PV
/// table and counters. Shares the transposition table and the stop signals
/// with its peers.
pub struct SearchWorker {
    id: usize,
    signals: Arc<SearchSignals>,
    tt: Arc<TranspositionTable>,
    params: SearchParams,
    see_values: [i32; 6],
    lmr: Box<LmrTable>,
    history: HistoryTables,
    stack: SearchStack,
    pv: PvTable,
    /// Nodes spent below each root move in the current iteration, `[from][to]`
    root_nodes: Box<[[u64; 64]; 64]>,
    nodes: u64,
    seldepth: usize,
    /// Null moves are barred below this ply during a verification search
    min_nmp_ply: usize,
    start: Instant,
    /// Hard time limit checked inside the tree
    hard_time: Option<Duration>,
    node_limit: Option<u64>,
    logger: Arc<dyn SearchLogger + Send + Sync>,
}

impl SearchWorker {
    /// A standalone worker with its own stop signal and silent output.
    #[must_use]
    pub fn new(tt: Arc<TranspositionTable>) -> Self {
        Self::with_signals(0, SearchSignals::new(1), tt, Arc::new(SilentLogger))
    }

    pub(crate) fn with_signals(
        id: usize,
        signals: Arc<SearchSignals>,
        tt: Arc<TranspositionTable>,
        logger: Arc<dyn SearchLogger + Send + Sync>,
    ) -> Self {
        let params = SearchParams::default();
        SearchWorker {
            id,
            signals,
            tt,
            see_values: params.see_values(),
            lmr: build_lmr_table(params.lmr_offset, params.lmr_div),
            params,
            history: HistoryTables::new(),
            stack: SearchStack::new(),
            pv: PvTable::new(),
            root_nodes: Box::new([[0; 64]; 64]),
            nodes: 0,
            seldepth: 0,
            min_nmp_ply: 0,
            start: Instant::now(),
            hard_time: None,
            node_limit: None,
            logger,
        }
    }

    /// Report progress through `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn SearchLogger + Send + Sync>) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.set_params(params);
        self
    }

    pub fn set_params(&mut self, params: SearchParams) {
        if params.lmr_offset != self.params.lmr_offset || params.lmr_div != self.params.lmr_div {
            self.lmr = build_lmr_table(params.lmr_offset, params.lmr_div);
        }
        self.see_values = params.see_values();
        self.params = params;
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn set_tt(&mut self, tt: Arc<TranspositionTable>) {
        self.tt = tt;
    }

    #[must_use]
    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// Signals used to stop this worker from another thread.
    #[must_use]
    pub fn signals(&self) -> Arc<SearchSignals> {
        Arc::clone(&self.signals)
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn is_main(&self) -> bool {
        self.id == 0
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    #[must_use]
    pub fn history(&self) -> &HistoryTables {
        &self.history
    }

    /// Forget all learned history, as on a new game.
    pub fn clear(&mut self) {
        self.history.clear();
        self.stack.reset();
        self.pv.clear();
    }

    /// Search `board` under `limits`, clearing any earlier stop request.
    /// See [`SearchWorker::iterative_deepening`].
    pub fn search(&mut self, board: &mut Board, limits: &SearchLimits) -> SearchOutcome {
        self.signals.reset(self.id);
        self.iterative_deepening(board, limits)
    }

    #[inline]
    fn stopped(&self) -> bool {
        self.signals.is_stopped(self.id)
    }

    /// Poll the stop flag, and every `CHECK_INTERVAL` nodes at non-root
    /// nodes the hard time and node limits. A breach raises the stop flag.
    #[inline]
    fn should_stop(&mut self, ply: usize) -> bool {
        if self.stopped() {
            return true;
        }
        if ply != 0 && self.nodes % constants::CHECK_INTERVAL == 0 {
            self.signals.publish_nodes(self.id, self.nodes);
            let out_of_time = self.hard_time.is_some_and(|limit| self.start.elapsed() > limit);
            let out_of_nodes = self.node_limit.is_some_and(|limit| self.nodes >= limit);
            if out_of_time || out_of_nodes {
                self.signals.stop(self.id);
                return true;
            }
        }
        false
    }
}

impl std::fmt::Debug for SearchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchWorker")
            .field("id", &self.id)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

/// Single-threaded search to a fixed depth with a fresh worker.
#[must_use]
pub fn search_depth(board: &mut Board, tt: Arc<TranspositionTable>, depth: i32) -> SearchOutcome {
    SearchWorker::new(tt).search(board, &SearchLimits::depth(depth))
}
