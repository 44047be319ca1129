//! Per-ply search state and the principal variation table.

use std::ops::{Index, IndexMut};

use crate::board::nnue::AccumulatorPair;
use crate::board::{Board, Color, Move, MAX_PLY};

use super::history::ContKey;

/// Entries past `MAX_PLY` so that `ply + 2` lookups stay in bounds.
const STACK_SIZE: usize = MAX_PLY + 4;

#[derive(Clone, Debug)]
pub(crate) struct StackEntry {
    pub static_eval: i32,
    /// Move made from this ply, `Move::NULL` for a null move
    pub mv: Move,
    /// Side that made `mv`
    pub mover: Color,
    pub reduction: i32,
    pub in_check: bool,
    /// Accumulators as they were before `mv` was made
    pub acc: Option<AccumulatorPair>,
}

impl Default for StackEntry {
    fn default() -> Self {
        StackEntry {
            static_eval: 0,
            mv: Move::NULL,
            mover: Color::White,
            reduction: 0,
            in_check: false,
            acc: None,
        }
    }
}

impl StackEntry {
    /// Copy the board's accumulators into this entry, reusing its buffers.
    pub fn snapshot(&mut self, board: &Board) {
        match (self.acc.as_mut(), board.accumulator()) {
            (Some(dst), Some(src)) => dst.clone_from(src),
            (None, Some(src)) => self.acc = Some(src.clone()),
            (_, None) => self.acc = None,
        }
    }
}

pub(crate) struct SearchStack {
    entries: Vec<StackEntry>,
}

impl SearchStack {
    pub fn new() -> Self {
        SearchStack {
            entries: vec![StackEntry::default(); STACK_SIZE],
        }
    }

    /// Reset everything but the accumulator buffers.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.static_eval = 0;
            entry.mv = Move::NULL;
            entry.reduction = 0;
            entry.in_check = false;
        }
    }

    /// Continuation keys for the moves one and two plies before `ply`.
    pub fn cont_keys(&self, ply: usize) -> [Option<ContKey>; 2] {
        let key = |offset: usize| {
            ply.checked_sub(offset)
                .and_then(|idx| ContKey::new(self.entries[idx].mover, self.entries[idx].mv))
        };
        [key(1), key(2)]
    }
}

impl Index<usize> for SearchStack {
    type Output = StackEntry;

    fn index(&self, ply: usize) -> &StackEntry {
        &self.entries[ply]
    }
}

impl IndexMut<usize> for SearchStack {
    fn index_mut(&mut self, ply: usize) -> &mut StackEntry {
        &mut self.entries[ply]
    }
}

/// Triangular principal variation table.
pub(crate) struct PvTable {
    moves: Vec<[Move; MAX_PLY + 1]>,
    len: [usize; MAX_PLY + 1],
}

impl PvTable {
    pub fn new() -> Self {
        PvTable {
            moves: vec![[Move::NULL; MAX_PLY + 1]; MAX_PLY + 1],
            len: [0; MAX_PLY + 1],
        }
    }

    pub fn clear(&mut self) {
        self.len = [0; MAX_PLY + 1];
    }

    /// Start an empty line at `ply`.
    #[inline]
    pub fn clear_ply(&mut self, ply: usize) {
        if ply <= MAX_PLY {
            self.len[ply] = 0;
        }
    }

    /// `mv` followed by the line found one ply deeper becomes the line at `ply`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let child_len = self.len[ply + 1].min(MAX_PLY - ply);
        let (head, tail) = self.moves.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line[ply] = mv;
        line[ply + 1..ply + 1 + child_len].copy_from_slice(&tail[0][ply + 1..ply + 1 + child_len]);
        self.len[ply] = child_len + 1;
    }

    /// Line found at the root.
    pub fn root_line(&self) -> &[Move] {
        &self.moves[0][..self.len[0]]
    }

    pub fn best_move(&self) -> Option<Move> {
        self.root_line().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};

    #[test]
    fn test_pv_splice() {
        let a = Move::quiet(Square::new(1, 4), Square::new(2, 4), Piece::Pawn);
        let b = Move::quiet(Square::new(6, 4), Square::new(5, 4), Piece::Pawn);
        let c = Move::quiet(Square::new(0, 6), Square::new(2, 5), Piece::Knight);

        let mut pv = PvTable::new();
        pv.clear_ply(3);
        pv.update(2, c);
        pv.update(1, b);
        pv.update(0, a);
        assert_eq!(pv.root_line(), &[a, b, c]);
        assert_eq!(pv.best_move(), Some(a));

        pv.clear_ply(1);
        pv.update(0, c);
        assert_eq!(pv.root_line(), &[c]);
    }

    #[test]
    fn test_cont_keys_skip_null() {
        let mut stack = SearchStack::new();
        let mv = Move::quiet(Square::new(1, 4), Square::new(3, 4), Piece::Pawn);
        stack[0].mv = mv;
        stack[0].mover = Color::White;
        stack[1].mv = Move::NULL;
        let keys = stack.cont_keys(2);
        assert!(keys[0].is_none());
        assert_eq!(keys[1], ContKey::new(Color::White, mv));
        assert_eq!(stack.cont_keys(0), [None, None]);
    }
}
