//! Board module tests.
//!
//! - `perft.rs` - Move generation node counts
//! - `draw.rs` - Draw detection (50-move, repetition, insufficient material)
//! - `make_unmake.rs` - Make/unmake correctness, incremental keys and accumulators
//! - `see.rs` - Static exchange evaluation on tactical positions
//! - `search.rs` - Search internals (quiescence, history, TT soundness)
//! - `proptest.rs` - Property-based tests

mod draw;
mod make_unmake;
mod perft;
mod proptest;
mod search;
