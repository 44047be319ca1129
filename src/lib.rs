//! A chess engine search core: NNUE evaluation, a shared transposition
//! table, principal variation search with Lazy SMP, and a UCI front end.

pub mod board;
pub mod tt;
pub mod uci;
pub mod zobrist;

pub use board::{Board, Color, Move, Piece, SearchLimits, SearchOutcome, Square, WorkerPool};
pub use tt::TranspositionTable;
