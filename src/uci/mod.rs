//! Universal Chess Interface (UCI) protocol implementation.
//!
//! Handles communication with chess GUIs following the UCI specification,
//! plus a few console commands (`perft`, `bench`, `eval`, `spsa`, `d`).
//! Searches run on a [`WorkerPool`] in the background so the input loop
//! keeps answering `isready` and `stop` while the engine thinks.

use std::fmt;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::board::nnue::NnueNetwork;
use crate::board::{
    Board, FenError, MoveParseError, SearchLimits, SearchParams, SearchWorker, StdoutLogger,
    WorkerPool,
};
use crate::tt::{TranspositionTable, TtError};

pub mod command;
pub mod options;

pub use command::{parse_uci_command, GoParams, UciCommand};
pub use options::{OptionChange, UciOptions};

const ENGINE_NAME: &str = "chess_search";
const ENGINE_AUTHOR: &str = "the chess_search developers";

/// Default depth for the `bench` command.
pub const BENCH_DEPTH: i32 = 8;

/// Positions searched by `bench`.
pub const BENCH_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    "r2q1rk1/pp2bppp/2n1pn2/3p4/2PP4/2N1PN2/PP2BPPP/R2Q1RK1 w - - 0 10",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
    "8/8/4k3/8/2p5/8/B2K4/8 w - - 0 1",
];

/// Errors from handling one protocol command. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciError {
    MissingValue { option: String },
    InvalidValue { option: String, value: String },
    UnknownOption { name: String },
    /// `position` without `startpos` or `fen`
    MissingPosition,
    Fen(FenError),
    Move(MoveParseError),
    Tt(TtError),
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::MissingValue { option } => write!(f, "option {option} needs a value"),
            UciError::InvalidValue { option, value } => {
                write!(f, "invalid value '{value}' for option {option}")
            }
            UciError::UnknownOption { name } => write!(f, "unknown option {name}"),
            UciError::MissingPosition => write!(f, "position needs startpos or fen"),
            UciError::Fen(e) => write!(f, "invalid FEN: {e}"),
            UciError::Move(e) => write!(f, "invalid move: {e}"),
            UciError::Tt(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for UciError {}

impl From<FenError> for UciError {
    fn from(e: FenError) -> Self {
        UciError::Fen(e)
    }
}

impl From<MoveParseError> for UciError {
    fn from(e: MoveParseError) -> Self {
        UciError::Move(e)
    }
}

impl From<TtError> for UciError {
    fn from(e: TtError) -> Self {
        UciError::Tt(e)
    }
}

/// Build a board from the tokens after `position`:
/// `startpos|fen <6 fields> [moves <m1> <m2> ...]`.
pub fn parse_position(tokens: &[&str], network: Option<&Arc<NnueNetwork>>) -> Result<Board, UciError> {
    let (mut board, rest) = match tokens.split_first() {
        Some((&"startpos", rest)) => (Board::new(), rest),
        Some((&"fen", rest)) => {
            let end = rest.iter().position(|&t| t == "moves").unwrap_or(rest.len());
            (Board::try_from_fen(&rest[..end].join(" "))?, &rest[end..])
        }
        _ => return Err(UciError::MissingPosition),
    };

    if let Some(network) = network {
        board.set_network(Arc::clone(network));
    }

    if let Some((&"moves", moves)) = rest.split_first() {
        for notation in moves {
            let mv = board.parse_uci_move(notation)?;
            board.make_move(mv);
        }
    }

    Ok(board)
}

/// `name, int, value, min, max, step, 0.002` for every tunable.
#[must_use]
pub fn spsa_lines(params: &SearchParams) -> Vec<String> {
    params
        .tunables()
        .iter()
        .map(|t| format!("{}, int, {}, {}, {}, {}, 0.002", t.name, t.value, t.min, t.max, t.step()))
        .collect()
}

/// Total nodes of a fixed-depth search over [`BENCH_FENS`] with a fresh
/// single-threaded searcher.
pub fn run_bench(depth: i32, network: &Arc<NnueNetwork>, params: &SearchParams) -> u64 {
    let tt = Arc::new(TranspositionTable::new(16));
    let mut worker = SearchWorker::new(tt).with_params(params.clone());
    let limits = SearchLimits::depth(depth);
    BENCH_FENS
        .iter()
        .filter_map(|fen| Board::try_from_fen(fen).ok())
        .map(|mut board| {
            board.set_network(Arc::clone(network));
            worker.search(&mut board, &limits).nodes
        })
        .sum()
}

fn nps(nodes: u64, start: Instant) -> u64 {
    let micros = start.elapsed().as_micros().max(1);
    (u128::from(nodes) * 1_000_000 / micros) as u64
}

/// Protocol state: the current position, shared search resources and the
/// worker pool.
pub struct UciEngine {
    board: Board,
    tt: Arc<TranspositionTable>,
    pool: WorkerPool,
    params: SearchParams,
    options: UciOptions,
    network: Arc<NnueNetwork>,
}

impl UciEngine {
    /// Engine with default options and the built-in network. Fails if the
    /// transposition table or the worker threads cannot be allocated.
    pub fn new() -> io::Result<Self> {
        let options = UciOptions::default();
        let network = Arc::new(NnueNetwork::material());
        let mut board = Board::new();
        board.set_network(Arc::clone(&network));
        let tt = TranspositionTable::try_new(options.hash_mb).map_err(io::Error::other)?;
        Ok(UciEngine {
            board,
            tt: Arc::new(tt),
            pool: WorkerPool::new(options.threads, Arc::new(StdoutLogger))?,
            params: SearchParams::default(),
            options,
            network,
        })
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Read commands from stdin until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if !self.handle_line(&line?) {
                break;
            }
        }
        self.pool.stop();
        let _ = self.pool.wait();
        Ok(())
    }

    /// Process one line. Returns false on `quit`.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let Some(cmd) = parse_uci_command(line) else {
            return true;
        };
        match self.handle(cmd) {
            Ok(keep_going) => keep_going,
            Err(e @ UciError::Tt(_)) => {
                error!("{e}; keeping the previous table");
                true
            }
            Err(e) => {
                warn!("{e}");
                true
            }
        }
    }

    fn handle(&mut self, cmd: UciCommand) -> Result<bool, UciError> {
        match cmd {
            UciCommand::Uci => {
                println!("id name {ENGINE_NAME}");
                println!("id author {ENGINE_AUTHOR}");
                for line in self.options.declarations(&self.params) {
                    println!("{line}");
                }
                println!("uciok");
            }
            UciCommand::IsReady => println!("readyok"),
            UciCommand::UciNewGame => self.new_game(),
            UciCommand::SetOption { name, value } => self.set_option(&name, value.as_deref())?,
            UciCommand::Position(tokens) => {
                let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
                self.board = parse_position(&tokens, Some(&self.network))?;
            }
            UciCommand::Go(go) => {
                let limits = SearchLimits::from_go(&go, self.board.side_to_move());
                debug!("go with {} threads, {limits:?}", self.pool.threads());
                self.pool.start(&self.board, &limits, Arc::clone(&self.tt), &self.params);
            }
            UciCommand::Stop => self.pool.stop(),
            UciCommand::Quit => {
                self.pool.stop();
                return Ok(false);
            }
            UciCommand::Perft(depth) => self.perft(depth),
            UciCommand::Bench(depth) => {
                self.finish_search();
                let start = Instant::now();
                let nodes = run_bench(depth.unwrap_or(BENCH_DEPTH), &self.network, &self.params);
                println!("nodes {nodes} time {} nps {}", start.elapsed().as_millis(), nps(nodes, start));
            }
            UciCommand::Eval => {
                let eval = self.board.evaluate();
                let white = if self.board.side_to_move() == crate::board::Color::White {
                    eval
                } else {
                    -eval
                };
                println!("eval stm {eval} white {white}");
            }
            UciCommand::Spsa => {
                for line in spsa_lines(&self.params) {
                    println!("{line}");
                }
            }
            UciCommand::Display => println!("{}", self.board),
            UciCommand::Unknown(line) => warn!("unknown command: {line}"),
        }
        Ok(true)
    }

    /// Stop any running search and wait for the workers to go idle.
    fn finish_search(&mut self) {
        self.pool.stop();
        let _ = self.pool.wait();
    }

    fn new_game(&mut self) {
        self.finish_search();
        self.tt.clear();
        self.pool.clear_histories();
        self.board = Board::new();
        self.board.set_network(Arc::clone(&self.network));
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), UciError> {
        match self.options.apply(name, value, &self.params)? {
            OptionChange::Hash(mb) => {
                self.finish_search();
                self.tt = Arc::new(TranspositionTable::try_new(mb)?);
                info!("hash set to {mb} MB");
            }
            OptionChange::Threads(threads) => {
                self.finish_search();
                match WorkerPool::new(threads, Arc::new(StdoutLogger)) {
                    Ok(pool) => {
                        self.pool = pool;
                        info!("using {threads} search threads");
                    }
                    Err(e) => warn!("could not start {threads} threads: {e}"),
                }
            }
            OptionChange::EvalFile(path) => {
                self.finish_search();
                self.network = if path.is_empty() {
                    Arc::new(NnueNetwork::material())
                } else {
                    Arc::new(NnueNetwork::load_or_zeroed(&path))
                };
                self.board.set_network(Arc::clone(&self.network));
            }
            OptionChange::Param { name, value } => {
                self.params.set(&name, value);
                info!("{name} set to {}", self.params.get(&name).unwrap_or(value));
            }
        }
        Ok(())
    }

    fn perft(&mut self, depth: u32) {
        self.finish_search();
        let start = Instant::now();
        let mut total = 0;
        for (mv, nodes) in self.board.perft_divide(depth) {
            println!("{mv}: {nodes}");
            total += nodes;
        }
        println!("nodes {total} time {} nps {}", start.elapsed().as_millis(), nps(total, start));
    }
}

impl fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UciEngine")
            .field("fen", &self.board.to_fen())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
