//! History heuristics owned by one search worker.
//!
//! Quiet, capture and continuation histories are bounded accumulators
//! updated with `entry += bonus - entry * |bonus| / HISTORY_MAX`. The
//! correction histories track how far static evaluation drifts from search
//! results for a given pawn, non-pawn or minor-piece structure.

use crate::board::{Bitboard, Board, Color, Move, Piece, Square, MAX_PLY};

use super::constants::MATE_BOUND;
use super::params::SearchParams;

/// Bound on every quiet, capture and continuation history entry.
pub const HISTORY_MAX: i32 = 16384;

/// Buckets per correction-history table.
pub const CORRHIST_SIZE: usize = 16384;
/// Fixed-point scale of correction entries.
pub const CORRHIST_GRAIN: i32 = 256;
/// Weight denominator of the correction moving average.
pub const CORRHIST_WEIGHT_SCALE: i32 = 256;
/// Bound on every correction entry.
pub const CORRHIST_MAX: i32 = 8192;

/// Bounded-history update law.
#[inline]
pub fn update_entry(entry: &mut i16, bonus: i32) {
    let bonus = bonus.clamp(-HISTORY_MAX, HISTORY_MAX);
    let current = i32::from(*entry);
    let updated = current + bonus - current * bonus.abs() / HISTORY_MAX;
    *entry = updated.clamp(-HISTORY_MAX, HISTORY_MAX) as i16;
}

/// `min(max, base + mult * depth)`
#[inline]
#[must_use]
pub fn scaled_bonus(depth: i32, base: i32, mult: i32, max: i32) -> i32 {
    (base + mult * depth).min(max)
}

/// Index of a piece of a given color, `0..12`.
#[inline]
#[must_use]
pub fn colored_piece(color: Color, piece: Piece) -> usize {
    color.index() * 6 + piece.index()
}

/// A move played earlier on the current line, as seen by continuation history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContKey {
    pub piece: usize,
    pub to: Square,
}

impl ContKey {
    #[must_use]
    pub fn new(color: Color, mv: Move) -> Option<Self> {
        if mv.is_null() {
            return None;
        }
        Some(ContKey {
            piece: colored_piece(color, mv.piece()),
            to: mv.to(),
        })
    }
}

type MainHistory = [[[[[i16; 2]; 2]; 64]; 64]; 2];
type CaptureHistory = [[[[i16; 2]; 6]; 64]; 12];
type ContinuationTable = [[[i16; 64]; 12]; 64];

pub struct HistoryTables {
    /// `[side][from][to][from attacked][to attacked]`
    main: Box<MainHistory>,
    /// `[colored attacker][to][victim][to attacked]`
    capture: Box<CaptureHistory>,
    /// `[previous colored piece][previous to][colored piece][to]`
    continuation: Vec<ContinuationTable>,
    /// `[side to move][pawn key bucket]`
    pawn_corr: Box<[[i16; CORRHIST_SIZE]; 2]>,
    /// `[piece color][side to move][non-pawn key bucket]`
    non_pawn_corr: Box<[[[i16; CORRHIST_SIZE]; 2]; 2]>,
    /// `[side to move][minor key bucket]`
    minor_corr: Box<[[i16; CORRHIST_SIZE]; 2]>,
    killers: [Move; MAX_PLY + 1],
}

impl Default for HistoryTables {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryTables {
    #[must_use]
    pub fn new() -> Self {
        HistoryTables {
            main: Box::new([[[[[0; 2]; 2]; 64]; 64]; 2]),
            capture: Box::new([[[[0; 2]; 6]; 64]; 12]),
            continuation: vec![[[[0; 64]; 12]; 64]; 12],
            pawn_corr: Box::new([[0; CORRHIST_SIZE]; 2]),
            non_pawn_corr: Box::new([[[0; CORRHIST_SIZE]; 2]; 2]),
            minor_corr: Box::new([[0; CORRHIST_SIZE]; 2]),
            killers: [Move::NULL; MAX_PLY + 1],
        }
    }

    /// Forget everything, as on a new game.
    pub fn clear(&mut self) {
        for side in self.main.iter_mut() {
            for from in side.iter_mut() {
                for to in from.iter_mut() {
                    *to = [[0; 2]; 2];
                }
            }
        }
        for piece in self.capture.iter_mut() {
            for to in piece.iter_mut() {
                *to = [[0; 2]; 6];
            }
        }
        for table in &mut self.continuation {
            for to in table.iter_mut() {
                for piece in to.iter_mut() {
                    *piece = [0; 64];
                }
            }
        }
        for side in self.pawn_corr.iter_mut().chain(self.minor_corr.iter_mut()) {
            side.fill(0);
        }
        for color in self.non_pawn_corr.iter_mut() {
            for side in color.iter_mut() {
                side.fill(0);
            }
        }
        self.killers = [Move::NULL; MAX_PLY + 1];
    }

    // ========================================================================
    // Quiet history
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn main_score(&self, side: Color, mv: Move, threats: Bitboard) -> i32 {
        let from = mv.from();
        let to = mv.to();
        i32::from(
            self.main[side.index()][from.index()][to.index()][usize::from(threats.contains(from))]
                [usize::from(threats.contains(to))],
        )
    }

    pub fn update_main(&mut self, side: Color, mv: Move, threats: Bitboard, bonus: i32) {
        let from = mv.from();
        let to = mv.to();
        let entry = &mut self.main[side.index()][from.index()][to.index()]
            [usize::from(threats.contains(from))][usize::from(threats.contains(to))];
        update_entry(entry, bonus);
    }

    // ========================================================================
    // Capture history
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn capture_score(&self, side: Color, mv: Move, victim: Piece, threats: Bitboard) -> i32 {
        let to = mv.to();
        i32::from(
            self.capture[colored_piece(side, mv.piece())][to.index()][victim.index()]
                [usize::from(threats.contains(to))],
        )
    }

    pub fn update_capture(&mut self, side: Color, mv: Move, victim: Piece, threats: Bitboard, bonus: i32) {
        let to = mv.to();
        let entry = &mut self.capture[colored_piece(side, mv.piece())][to.index()][victim.index()]
            [usize::from(threats.contains(to))];
        update_entry(entry, bonus);
    }

    // ========================================================================
    // Continuation history
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn cont_score(&self, prev: ContKey, side: Color, mv: Move) -> i32 {
        i32::from(
            self.continuation[prev.piece][prev.to.index()][colored_piece(side, mv.piece())]
                [mv.to().index()],
        )
    }

    /// Sum over the moves one and two plies back.
    #[inline]
    #[must_use]
    pub fn cont_total(&self, prev: &[Option<ContKey>; 2], side: Color, mv: Move) -> i32 {
        prev.iter()
            .flatten()
            .map(|key| self.cont_score(*key, side, mv))
            .sum()
    }

    pub fn update_cont(&mut self, prev: &[Option<ContKey>; 2], side: Color, mv: Move, bonus: i32) {
        let piece = colored_piece(side, mv.piece());
        for key in prev.iter().flatten() {
            let entry = &mut self.continuation[key.piece][key.to.index()][piece][mv.to().index()];
            update_entry(entry, bonus);
        }
    }

    // ========================================================================
    // Killers
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn killer(&self, ply: usize) -> Move {
        self.killers.get(ply).copied().unwrap_or(Move::NULL)
    }

    pub fn set_killer(&mut self, ply: usize, mv: Move) {
        if let Some(slot) = self.killers.get_mut(ply) {
            *slot = mv;
        }
    }

    // ========================================================================
    // Correction history
    // ========================================================================

    #[inline]
    fn bucket(key: u64) -> usize {
        (key % CORRHIST_SIZE as u64) as usize
    }

    /// Raw correction entries `(pawn, non-pawn white, non-pawn black, minor)`
    /// for the board's structure keys.
    #[must_use]
    pub fn correction_entries(&self, board: &Board) -> (i32, i32, i32, i32) {
        let stm = board.side_to_move().index();
        (
            i32::from(self.pawn_corr[stm][Self::bucket(board.pawn_key())]),
            i32::from(
                self.non_pawn_corr[Color::White.index()][stm]
                    [Self::bucket(board.non_pawn_key(Color::White))],
            ),
            i32::from(
                self.non_pawn_corr[Color::Black.index()][stm]
                    [Self::bucket(board.non_pawn_key(Color::Black))],
            ),
            i32::from(self.minor_corr[stm][Self::bucket(board.minor_key())]),
        )
    }

    /// Static evaluation shifted by the learned drift, kept out of the mate band.
    #[must_use]
    pub fn corrected_eval(&self, board: &Board, raw: i32, params: &SearchParams) -> i32 {
        let (pawn, white_np, black_np, minor) = self.correction_entries(board);
        let adjust = (pawn * params.corr_pawn_weight
            + (white_np + black_np) * params.corr_nonpawn_weight
            + minor * params.corr_minor_weight)
            / 128;
        (raw + adjust / CORRHIST_GRAIN).clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
    }

    /// Move every correction table toward `diff` (searched minus static).
    pub fn update_correction(&mut self, board: &Board, depth: i32, diff: i32) {
        let stm = board.side_to_move().index();
        let scaled = diff * CORRHIST_GRAIN;
        let weight = (depth + 1).clamp(1, 16);

        let blend = |entry: &mut i16| {
            let current = i32::from(*entry);
            let updated =
                (current * (CORRHIST_WEIGHT_SCALE - weight) + scaled * weight) / CORRHIST_WEIGHT_SCALE;
            *entry = updated.clamp(-CORRHIST_MAX, CORRHIST_MAX) as i16;
        };

        blend(&mut self.pawn_corr[stm][Self::bucket(board.pawn_key())]);
        for color in Color::BOTH {
            blend(&mut self.non_pawn_corr[color.index()][stm][Self::bucket(board.non_pawn_key(color))]);
        }
        blend(&mut self.minor_corr[stm][Self::bucket(board.minor_key())]);
    }
}

impl std::fmt::Debug for HistoryTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryTables").finish_non_exhaustive()
    }
}
