//! Search constants.
//!
//! Score bounds, move ordering priorities and the late move reduction table.
//! Everything that is tuned lives in [`super::SearchParams`] instead.

use std::sync::LazyLock;

use crate::board::MAX_PLY;

// ============================================================================
// SCORES
// ============================================================================

/// Score of a mate delivered at the root. Mates found deeper score
/// `MATE - ply`.
pub const MATE: i32 = 49000;

/// Larger than any reachable score; the initial window is `-INFINITE..INFINITE`.
pub const INFINITE: i32 = 50000;

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_BOUND: i32 = MATE - MAX_PLY as i32;

#[inline]
#[must_use]
pub const fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_BOUND
}

// ============================================================================
// MOVE ORDERING PRIORITIES
// ============================================================================

/// Hash move, tried first
pub const TT_MOVE_SCORE: i32 = 900_000_000;

/// Added to captures that pass the ordering SEE threshold
pub const GOOD_CAPTURE_BONUS: i32 = 200_000;

/// Added to captures that fail the ordering SEE threshold
pub const BAD_CAPTURE_PENALTY: i32 = -1_000_000;

/// Killer move for the current ply
pub const KILLER_SCORE: i32 = 20_000;

/// Offset that places quiet moves below killers
pub const QUIET_OFFSET: i32 = 32_768;

/// Quiet promotions met in quiescence
pub const QS_QUIET_SCORE: i32 = -90_000;

// ============================================================================
// LIMITS
// ============================================================================

/// Nodes between time and node-limit checks
pub const CHECK_INTERVAL: u64 = 1024;

/// Aspiration windows wider than this open to the full range
pub const ASPIRATION_MAX_DELTA: i32 = 300;

/// Node-fraction time management kicks in from this depth
pub const NODE_TM_MIN_DEPTH: i32 = 6;

// ============================================================================
// REDUCTIONS
// ============================================================================

/// Late move reductions apply from this depth up
pub const MIN_LMR_DEPTH: i32 = 3;

/// LMR table dimensions (depth x moves searched)
pub const LMR_TABLE_DEPTH: usize = MAX_PLY;
pub const LMR_TABLE_MOVES: usize = 256;

pub type LmrTable = [[i32; LMR_TABLE_MOVES]; LMR_TABLE_DEPTH];

/// `floor(offset/100 + ln(moves) * ln(depth) / (divisor/100))`, in plies.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
#[must_use]
pub fn build_lmr_table(offset: i32, divisor: i32) -> Box<LmrTable> {
    let mut table = Box::new([[0; LMR_TABLE_MOVES]; LMR_TABLE_DEPTH]);
    let offset = f64::from(offset) / 100.0;
    let divisor = f64::from(divisor.max(1)) / 100.0;
    for (depth, row) in table.iter_mut().enumerate().skip(1) {
        for (moves, cell) in row.iter_mut().enumerate().skip(1) {
            let value = offset + (moves as f64).ln() * (depth as f64).ln() / divisor;
            *cell = value.floor() as i32;
        }
    }
    table
}

/// Table for the default LMR parameters.
pub static DEFAULT_LMR: LazyLock<Box<LmrTable>> = LazyLock::new(|| {
    let params = super::SearchParams::default();
    build_lmr_table(params.lmr_offset, params.lmr_div)
});
