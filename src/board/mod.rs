//! Chess board representation and the search built on it.
//!
//! Uses bitboards for move generation and an NNUE network for evaluation.
//! Supports full chess rules including castling, en passant, and promotions.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use chess_search::board::{search_depth, Board};
//! use chess_search::TranspositionTable;
//!
//! let mut board = Board::new();
//! let outcome = search_depth(&mut board, Arc::new(TranspositionTable::new(1)), 3);
//! assert!(outcome.best_move.is_some());
//! ```

mod attack_tables;
mod error;
mod fen;
mod make_unmake;
mod movegen;
pub mod nnue;
mod see;
pub mod search;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use error::{FenError, MoveParseError, SquareError};
pub use see::SEE_VALUES;
pub use state::{Board, NullMoveInfo, UnmakeInfo};
pub use types::{
    Bitboard, BitboardIter, CastlingRights, Color, Move, MoveList, Piece, ScoredMove, ScoredMoveList,
    Square, MAX_PLY,
};

pub use search::{
    search_depth, time_budget, SearchInfo, SearchLimits, SearchLogger, SearchOutcome, SearchParams,
    SearchSignals, SearchWorker, SilentLogger, StdoutLogger, TimeControl, Tunable, WorkerPool, INFINITE,
    MATE,
};

pub(crate) use types::PROMOTION_PIECES;
