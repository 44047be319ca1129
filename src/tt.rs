//! Transposition table for caching search results.
//!
//! One slot per index, `hash % capacity`, and every store overwrites the
//! slot. Each field of an entry is its own relaxed atomic, so concurrent
//! Lazy SMP workers may interleave writes to a slot; a reader that sees a
//! mixed entry just gets a key mismatch or a slightly stale move/score,
//! both of which the search tolerates.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicI32, AtomicU16, AtomicU64, Ordering};

use crate::board::{Move, MATE, MAX_PLY};

/// Default table size in megabytes.
pub const DEFAULT_TT_MB: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    /// Score is at least this value (failed high)
    Lower = 0,
    /// Score is the exact value
    Exact = 1,
    /// Score is at most this value (failed low)
    Upper = 2,
    /// Empty slot
    None = 3,
}

impl Bound {
    fn from_bits(bits: u16) -> Self {
        match bits & 0x3 {
            0 => Bound::Lower,
            1 => Bound::Exact,
            2 => Bound::Upper,
            _ => Bound::None,
        }
    }
}

/// Packed metadata: depth in bits 0-7, bound in 8-9, tt-pv flag in bit 10.
#[inline]
fn pack_info(depth: u8, bound: Bound, tt_pv: bool) -> u16 {
    u16::from(depth) | ((bound as u16) << 8) | (u16::from(tt_pv) << 10)
}

/// A snapshot of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub key: u64,
    pub score: i32,
    /// Packed from/to/type of the best move, 0 for none
    pub mv: u16,
    pub depth: u8,
    pub bound: Bound,
    pub tt_pv: bool,
}

impl TtEntry {
    /// True if the slot holds data for `hash`.
    #[inline]
    #[must_use]
    pub fn hit(&self, hash: u64) -> bool {
        self.key == hash && self.bound != Bound::None
    }
}

#[derive(Default)]
struct Slot {
    key: AtomicU64,
    score: AtomicI32,
    mv: AtomicU16,
    info: AtomicU16,
}

impl Slot {
    fn reset(&self) {
        self.key.store(0, Ordering::Relaxed);
        self.score.store(0, Ordering::Relaxed);
        self.mv.store(0, Ordering::Relaxed);
        self.info.store(pack_info(0, Bound::None, false), Ordering::Relaxed);
    }

    fn empty() -> Self {
        let slot = Slot::default();
        slot.info.store(pack_info(0, Bound::None, false), Ordering::Relaxed);
        slot
    }
}

/// Allocation failure when building or resizing a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtError {
    AllocationFailed { entries: usize },
}

impl fmt::Display for TtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtError::AllocationFailed { entries } => {
                write!(f, "could not allocate a transposition table of {entries} entries")
            }
        }
    }
}

impl std::error::Error for TtError {}

/// Mate scores are stored relative to the node, not the root.
#[inline]
#[must_use]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE - MAX_PLY as i32 {
        score + ply
    } else if score <= -(MATE - MAX_PLY as i32) {
        score - ply
    } else {
        score
    }
}

#[inline]
#[must_use]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE - MAX_PLY as i32 {
        score - ply
    } else if score <= -(MATE - MAX_PLY as i32) {
        score + ply
    } else {
        score
    }
}

/// Thread-safe transposition table shared by every search worker.
pub struct TranspositionTable {
    slots: Vec<Slot>,
}

impl TranspositionTable {
    /// Build a table of `size_mb` megabytes.
    pub fn try_new(size_mb: usize) -> Result<Self, TtError> {
        let entries = Self::entries_for(size_mb);
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(entries)
            .map_err(|_| TtError::AllocationFailed { entries })?;
        slots.extend((0..entries).map(|_| Slot::empty()));
        Ok(TranspositionTable { slots })
    }

    /// Build a table of `size_mb` megabytes with infallible allocation.
    /// Running out of memory aborts the process; callers that must recover
    /// use [`TranspositionTable::try_new`].
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entries = Self::entries_for(size_mb);
        TranspositionTable {
            slots: (0..entries).map(|_| Slot::empty()).collect(),
        }
    }

    /// Number of entries in `size_mb` megabytes, rounded down to even.
    fn entries_for(size_mb: usize) -> usize {
        let bytes = size_mb.saturating_mul(1024 * 1024);
        let entries = bytes / mem::size_of::<Slot>();
        (entries & !1).max(2)
    }

    /// Replace the table with one of `size_mb` megabytes. On failure the
    /// current table is kept.
    pub fn resize(&mut self, size_mb: usize) -> Result<(), TtError> {
        *self = Self::try_new(size_mb)?;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, hash: u64) -> &Slot {
        &self.slots[(hash % self.slots.len() as u64) as usize]
    }

    /// Read the slot for `hash`. The caller checks [`TtEntry::hit`].
    /// Mate scores come back relative to `ply`.
    #[inline]
    #[must_use]
    pub fn probe(&self, hash: u64, ply: usize) -> TtEntry {
        let slot = self.slot(hash);
        let info = slot.info.load(Ordering::Relaxed);
        TtEntry {
            key: slot.key.load(Ordering::Relaxed),
            score: score_from_tt(slot.score.load(Ordering::Relaxed), ply),
            mv: slot.mv.load(Ordering::Relaxed),
            depth: (info & 0xFF) as u8,
            bound: Bound::from_bits(info >> 8),
            tt_pv: (info >> 10) & 1 != 0,
        }
    }

    /// Overwrite the slot for `hash`.
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn store(
        &self,
        hash: u64,
        mv: Move,
        score: i32,
        depth: i32,
        bound: Bound,
        tt_pv: bool,
        ply: usize,
    ) {
        let slot = self.slot(hash);
        let depth = depth.clamp(0, 255) as u8;
        slot.key.store(hash, Ordering::Relaxed);
        slot.score.store(score_to_tt(score, ply), Ordering::Relaxed);
        slot.mv.store(mv.as_u16(), Ordering::Relaxed);
        slot.info.store(pack_info(depth, bound, tt_pv), Ordering::Relaxed);
    }

    /// Hint the CPU to pull the slot for `hash` into cache.
    #[inline]
    pub fn prefetch(&self, hash: u64) {
        #[cfg(target_arch = "x86_64")]
        {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
            let ptr = self.slot(hash) as *const Slot as *const i8;
            // SAFETY: prefetching a valid address has no observable effect
            unsafe { _mm_prefetch(ptr, _MM_HINT_T0) };
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = hash;
        }
    }

    /// Occupied entries among the first 1000, in per mille.
    #[must_use]
    pub fn hashfull(&self) -> usize {
        let sample = self.slots.len().min(1000);
        let used = self
            .slots
            .iter()
            .take(sample)
            .filter(|slot| Bound::from_bits(slot.info.load(Ordering::Relaxed) >> 8) != Bound::None)
            .count();
        used * 1000 / sample
    }

    /// Clear all entries from the table.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.reset();
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        TranspositionTable::new(DEFAULT_TT_MB)
    }
}

impl fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};

    #[test]
    fn test_store_and_probe() {
        let tt = TranspositionTable::try_new(1).expect("1 MB table");
        let hash = 0x1234_5678_9ABC_DEF0;
        let mv = Move::quiet(Square::new(1, 4), Square::new(2, 4), Piece::Pawn);

        tt.store(hash, mv, 500, 10, Bound::Exact, true, 0);

        let entry = tt.probe(hash, 0);
        assert!(entry.hit(hash));
        assert_eq!(entry.depth, 10);
        assert_eq!(entry.score, 500);
        assert_eq!(entry.bound, Bound::Exact);
        assert!(entry.tt_pv);
        assert!(mv.matches(entry.mv));
    }

    #[test]
    fn test_empty_slot_is_not_a_hit() {
        let tt = TranspositionTable::try_new(1).expect("1 MB table");
        let entry = tt.probe(0, 0);
        assert_eq!(entry.bound, Bound::None);
        assert!(!entry.hit(0));
        assert_eq!(tt.hashfull(), 0);
    }

    #[test]
    fn test_store_overwrites_same_slot() {
        let tt = TranspositionTable::try_new(1).expect("1 MB table");
        let cap = tt.capacity() as u64;
        let first = 7;
        let second = 7 + cap;

        tt.store(first, Move::NULL, 10, 20, Bound::Lower, false, 0);
        tt.store(second, Move::NULL, -5, 1, Bound::Upper, false, 0);

        assert!(!tt.probe(first, 0).hit(first));
        let entry = tt.probe(second, 0);
        assert!(entry.hit(second));
        assert_eq!(entry.depth, 1);
    }

    #[test]
    fn test_mate_scores_are_ply_relative() {
        let tt = TranspositionTable::try_new(1).expect("1 MB table");
        let mate_in_3_from_root = MATE - 5;
        tt.store(42, Move::NULL, mate_in_3_from_root, 4, Bound::Exact, false, 2);

        // Same node reached at a different ply keeps the same distance to mate.
        assert_eq!(tt.probe(42, 2).score, mate_in_3_from_root);
        assert_eq!(tt.probe(42, 4).score, MATE - 7);
        assert_eq!(score_from_tt(score_to_tt(-MATE + 9, 3), 3), -MATE + 9);
        assert_eq!(score_to_tt(123, 10), 123);
    }

    #[test]
    fn test_capacity_is_even_and_clear_empties() {
        let tt = TranspositionTable::try_new(1).expect("1 MB table");
        assert_eq!(tt.capacity() % 2, 0);
        for hash in 0..1000u64 {
            tt.store(hash, Move::NULL, 0, 1, Bound::Exact, false, 0);
        }
        assert_eq!(tt.hashfull(), 1000);
        tt.clear();
        assert_eq!(tt.hashfull(), 0);
    }

    #[test]
    fn test_resize_changes_capacity() {
        let mut tt = TranspositionTable::try_new(1).expect("1 MB table");
        let before = tt.capacity();
        tt.resize(2).expect("2 MB table");
        assert_eq!(tt.capacity(), before * 2);
    }

    #[test]
    fn test_concurrent_stores_read_back_known_fields() {
        use std::collections::HashSet;
        use std::thread;

        let tt = TranspositionTable::try_new(1).expect("1 MB table");
        let cap = tt.capacity() as u64;
        let moves: Vec<Move> = (0..4)
            .map(|i| Move::quiet(Square::new(1, i), Square::new(2, i), Piece::Pawn))
            .collect();
        let known_moves: HashSet<u16> = moves.iter().map(|mv| mv.as_u16()).chain([0]).collect();

        // Keys collide on the same 64 slots across threads
        thread::scope(|scope| {
            for t in 0..4u64 {
                let tt = &tt;
                let moves = &moves;
                let known_moves = &known_moves;
                scope.spawn(move || {
                    for i in 0..20_000u64 {
                        let hash = (i % 64) + cap * ((i + t) % 3);
                        let mv = moves[(i as usize + t as usize) % moves.len()];
                        let bound = [Bound::Lower, Bound::Exact, Bound::Upper][(i % 3) as usize];
                        tt.store(hash, mv, 100 * t as i32, (t + 1) as i32, bound, t % 2 == 0, 0);

                        let entry = tt.probe(hash, 0);
                        assert!(known_moves.contains(&entry.mv));
                        assert!((1..=4).contains(&entry.depth));
                        assert!([0, 100, 200, 300].contains(&entry.score));
                        assert_ne!(entry.bound, Bound::None);
                    }
                });
            }
        });

        assert!(tt.hashfull() > 0);
    }

    #[test]
    fn test_hashfull_is_per_mille_on_small_tables() {
        let tt = TranspositionTable::new(0);
        assert_eq!(tt.capacity(), 2);
        tt.store(0, Move::NULL, 0, 1, Bound::Exact, false, 0);
        assert_eq!(tt.hashfull(), 500);
        tt.store(1, Move::NULL, 0, 1, Bound::Exact, false, 0);
        assert_eq!(tt.hashfull(), 1000);
    }

    #[test]
    fn test_oversized_table_is_an_error() {
        let err = TranspositionTable::try_new(usize::MAX).expect_err("cannot allocate");
        assert!(matches!(err, TtError::AllocationFailed { .. }));
        assert!(err.to_string().contains("could not allocate"));
    }
}
