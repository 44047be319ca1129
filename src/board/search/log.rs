//! Search progress reporting.

use std::fmt;

use crate::board::Move;

use super::constants::{is_mate_score, MATE};

/// Progress after one completed iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: i32,
    pub seldepth: usize,
    pub score: i32,
    pub time_ms: u128,
    /// Nodes of every worker combined
    pub nodes: u64,
    pub nps: u64,
    /// Transposition table fill in per mille
    pub hashfull: usize,
    pub pv: Vec<Move>,
}

/// `cp <score>` or `mate <moves>`, negative when getting mated.
#[must_use]
pub fn format_score(score: i32) -> String {
    if is_mate_score(score) {
        let plies = MATE - score.abs();
        let moves = (plies + 1) / 2;
        if score < 0 {
            format!("mate -{moves}")
        } else {
            format!("mate {moves}")
        }
    } else {
        format!("cp {score}")
    }
}

impl fmt::Display for SearchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "info depth {} seldepth {} score {} time {} nodes {} nps {} hashfull {} pv",
            self.depth,
            self.seldepth,
            format_score(self.score),
            self.time_ms,
            self.nodes,
            self.nps,
            self.hashfull,
        )?;
        for mv in &self.pv {
            write!(f, " {mv}")?;
        }
        Ok(())
    }
}

pub trait SearchLogger {
    /// Called by the main worker after every completed iteration.
    fn info(&self, info: &SearchInfo);

    /// Called once the main worker has finished searching.
    fn best_move(&self, _best: Option<Move>) {}
}

/// Writes protocol lines to stdout.
pub struct StdoutLogger;

impl SearchLogger for StdoutLogger {
    fn info(&self, info: &SearchInfo) {
        println!("{info}");
    }

    fn best_move(&self, best: Option<Move>) {
        match best {
            Some(mv) => println!("bestmove {mv}"),
            None => println!("bestmove 0000"),
        }
    }
}

/// Discards all output.
pub struct SilentLogger;

impl SearchLogger for SilentLogger {
    fn info(&self, _info: &SearchInfo) {}
}
