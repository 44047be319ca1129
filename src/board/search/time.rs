//! Time budgeting.
//!
//! A clock-based search gets a hard limit of half the remaining time and a
//! soft limit of `0.6 * (remaining / 20 + 3/4 * increment)`. The soft limit
//! is only consulted between iterations and may be stretched by node-fraction
//! scaling.

use std::time::Duration;

use super::SearchLimits;

/// Time control settings for one `go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeControl {
    /// No time limit
    #[default]
    Infinite,
    /// Fixed time per move, enforced as a hard limit
    MoveTime { time: Duration },
    /// Remaining clock time and increment for the side to move
    Incremental { remaining: Duration, increment: Duration },
}

/// `(soft, hard)` limits for a clock with `remaining` time and `increment`.
#[must_use]
pub fn time_budget(remaining: Duration, increment: Duration) -> (Duration, Duration) {
    let hard = remaining / 2;
    let soft = (remaining / 20 + increment * 3 / 4) * 3 / 5;
    (soft, hard)
}

impl TimeControl {
    /// Search limits for this time control, before depth and node caps.
    #[must_use]
    pub fn to_limits(self) -> SearchLimits {
        match self {
            TimeControl::Infinite => SearchLimits::default(),
            TimeControl::MoveTime { time } => SearchLimits::movetime(time),
            TimeControl::Incremental { remaining, increment } => {
                SearchLimits::from_clock(remaining, increment)
            }
        }
    }
}
