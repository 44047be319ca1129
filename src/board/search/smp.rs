//! Lazy SMP (Symmetric `MultiProcessing`) parallel search.
//!
//! Every thread searches the same position with its own histories and
//! search stack. The transposition table is the only shared structure, which
//! is enough to make the threads diverge and help each other. Worker 0 is the
//! main worker: it alone enforces time and node limits, reports progress and
//! stops the helpers when it finishes.
//!
//! Threads are spawned once and parked on a condition variable between
//! searches so that their histories survive from move to move.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use crate::board::Board;
use crate::tt::TranspositionTable;

use super::{SearchLimits, SearchLogger, SearchOutcome, SearchParams, SearchSignals, SearchWorker};

/// Search thread stack size (32 MB to handle deep recursion)
const SEARCH_STACK_SIZE: usize = 32 * 1024 * 1024;

enum Job {
    Search {
        board: Board,
        limits: SearchLimits,
        tt: Arc<TranspositionTable>,
        params: SearchParams,
    },
    /// Forget histories, as on a new game
    Clear,
}

struct PoolState {
    /// Bumped for every dispatched job
    generation: u64,
    job: Option<Arc<Job>>,
    /// Workers that have not finished the current job
    running: usize,
    /// Worker threads that have not died from a panic
    alive: usize,
    result: Option<SearchOutcome>,
    exit: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    work: Condvar,
    done: Condvar,
}

/// A fixed set of persistent search threads.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    signals: Arc<SearchSignals>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `threads` workers (at least one). Only the main worker reports
    /// through `logger`.
    pub fn new(threads: usize, logger: Arc<dyn SearchLogger + Send + Sync>) -> io::Result<Self> {
        let threads = threads.max(1);
        let signals = SearchSignals::new(threads);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                generation: 0,
                job: None,
                running: 0,
                alive: threads,
                result: None,
                exit: false,
            }),
            work: Condvar::new(),
            done: Condvar::new(),
        });

        let mut pool = WorkerPool {
            shared,
            signals,
            handles: Vec::with_capacity(threads),
        };

        for id in 0..threads {
            let shared = Arc::clone(&pool.shared);
            let signals = Arc::clone(&pool.signals);
            let logger = Arc::clone(&logger);
            let handle = thread::Builder::new()
                .name(format!("search-{id}"))
                .stack_size(SEARCH_STACK_SIZE)
                .spawn(move || worker_loop(id, &shared, signals, logger))?;
            pool.handles.push(handle);
        }

        debug!("started {threads} search threads");
        Ok(pool)
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn signals(&self) -> Arc<SearchSignals> {
        Arc::clone(&self.signals)
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.shared.state.lock().running > 0
    }

    /// Start searching `board` in the background. A search already in
    /// progress is stopped and its result discarded.
    pub fn start(&self, board: &Board, limits: &SearchLimits, tt: Arc<TranspositionTable>, params: &SearchParams) {
        self.stop();
        // The interrupted search's result is superseded
        let _ = self.wait();
        self.dispatch(Job::Search {
            board: board.clone(),
            limits: limits.clone(),
            tt,
            params: params.clone(),
        });
    }

    /// Ask every worker to stop. Returns immediately.
    pub fn stop(&self) {
        self.signals.stop_all();
    }

    /// Block until all workers are idle and take the main worker's result.
    pub fn wait(&self) -> Option<SearchOutcome> {
        let mut state = self.shared.state.lock();
        while state.running > 0 {
            self.shared.done.wait(&mut state);
        }
        state.result.take()
    }

    /// Search and block until done.
    pub fn search(
        &self,
        board: &Board,
        limits: &SearchLimits,
        tt: Arc<TranspositionTable>,
        params: &SearchParams,
    ) -> Option<SearchOutcome> {
        self.start(board, limits, tt, params);
        self.wait()
    }

    /// Clear the histories of every worker.
    pub fn clear_histories(&self) {
        self.stop();
        // The interrupted search's result is superseded
        let _ = self.wait();
        self.dispatch(Job::Clear);
        // A clear job produces no result
        let _ = self.wait();
    }

    fn dispatch(&self, job: Job) {
        for id in 0..self.signals.workers() {
            self.signals.reset(id);
        }
        let mut state = self.shared.state.lock();
        state.generation += 1;
        state.job = Some(Arc::new(job));
        state.running = state.alive;
        state.result = None;
        self.shared.work.notify_all();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        {
            let mut state = self.shared.state.lock();
            state.exit = true;
            self.shared.work.notify_all();
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.handles.len())
            .finish_non_exhaustive()
    }
}

/// Marks the owning worker as finished with its job when dropped, even if
/// the job panicked, so `wait` never blocks on a dead thread.
struct JobGuard<'a> {
    shared: &'a PoolShared,
    signals: &'a SearchSignals,
    outcome: Option<SearchOutcome>,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        let panicked = thread::panicking();
        if panicked {
            // Helpers only stop through the shared flags
            self.signals.stop_all();
        }
        let mut state = self.shared.state.lock();
        if let Some(outcome) = self.outcome.take() {
            state.result = Some(outcome);
        }
        if panicked {
            state.alive -= 1;
        }
        state.running -= 1;
        if state.running == 0 {
            self.shared.done.notify_all();
        }
    }
}

fn worker_loop(
    id: usize,
    shared: &PoolShared,
    signals: Arc<SearchSignals>,
    logger: Arc<dyn SearchLogger + Send + Sync>,
) {
    let mut worker: Option<SearchWorker> = None;
    let mut seen_generation = 0;

    loop {
        let job = {
            let mut state = shared.state.lock();
            while state.generation == seen_generation && !state.exit {
                shared.work.wait(&mut state);
            }
            if state.exit {
                return;
            }
            seen_generation = state.generation;
            state.job.clone()
        };

        let mut guard = JobGuard {
            shared,
            signals: &signals,
            outcome: None,
        };
        match job.as_deref() {
            Some(Job::Search {
                board,
                limits,
                tt,
                params,
            }) => {
                let worker = worker.get_or_insert_with(|| {
                    SearchWorker::with_signals(id, Arc::clone(&signals), Arc::clone(tt), Arc::clone(&logger))
                });
                worker.set_tt(Arc::clone(tt));
                worker.set_params(params.clone());

                let mut board = board.clone();
                let limits = if id == 0 { limits.clone() } else { limits.for_helper() };
                let result = worker.iterative_deepening(&mut board, &limits);

                if id == 0 {
                    signals.stop_all();
                    logger.best_move(result.best_move);
                    guard.outcome = Some(result);
                }
            }
            Some(Job::Clear) => {
                if let Some(worker) = worker.as_mut() {
                    worker.clear();
                }
            }
            None => {}
        }
    }
}
