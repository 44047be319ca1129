//! Pseudo-legal move generation.
//!
//! Generators push into a caller-owned [`MoveList`]. Legality (king safety,
//! castling through check) is decided after the move is made, see
//! [`Board::is_legal_after_move`].

mod kings;
mod knights;
mod pawns;
mod sliders;

use super::{Board, Move, MoveList};

impl Board {
    /// Every pseudo-legal move for the side to move.
    pub fn generate_pseudo_legal(&self, list: &mut MoveList) {
        let us = self.side_to_move;
        let targets = !self.occupied[us.index()];
        self.gen_pawn_moves(list, false);
        self.gen_knight_moves(list, targets);
        self.gen_slider_moves(list, targets);
        self.gen_king_moves(list, targets);
        self.gen_castling_moves(list);
    }

    /// Captures (en passant included) and every promotion, capturing or not.
    pub fn generate_noisy(&self, list: &mut MoveList) {
        let targets = self.occupied[self.side_to_move.opponent().index()];
        self.gen_pawn_moves(list, true);
        self.gen_knight_moves(list, targets);
        self.gen_slider_moves(list, targets);
        self.gen_king_moves(list, targets);
    }

    /// Fully legal moves.
    pub fn generate_moves(&mut self) -> MoveList {
        let mut pseudo = MoveList::new();
        self.generate_pseudo_legal(&mut pseudo);
        self.filter_legal(&pseudo)
    }

    fn filter_legal(&mut self, pseudo: &MoveList) -> MoveList {
        let mut legal = MoveList::new();
        for &mv in pseudo {
            let info = self.make_move(mv);
            if self.is_legal_after_move(mv) {
                legal.push(mv);
            }
            self.unmake_move(mv, info);
        }
        legal
    }

    /// True if the side to move has at least one legal move.
    pub fn has_legal_move(&mut self) -> bool {
        let mut pseudo = MoveList::new();
        self.generate_pseudo_legal(&mut pseudo);
        pseudo.iter().any(|&mv| {
            let info = self.make_move(mv);
            let legal = self.is_legal_after_move(mv);
            self.unmake_move(mv, info);
            legal
        })
    }

    pub fn is_checkmate(&mut self) -> bool {
        self.in_check() && !self.has_legal_move()
    }

    pub fn is_stalemate(&mut self) -> bool {
        !self.in_check() && !self.has_legal_move()
    }

    /// True if `mv` is pseudo-legal here. Used to vet moves coming from the
    /// transposition table or killer slots, which may belong to another position.
    #[must_use]
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }
        match self.piece_at(mv.from()) {
            Some((color, piece)) if color == self.side_to_move && piece == mv.piece() => {}
            _ => return false,
        }
        let mut list = MoveList::new();
        self.generate_pseudo_legal(&mut list);
        list.contains(mv)
    }

    /// Leaf count of the legal move tree to `depth`.
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let mut pseudo = MoveList::new();
        self.generate_pseudo_legal(&mut pseudo);

        let mut nodes = 0;
        for &mv in &pseudo {
            let info = self.make_move(mv);
            if self.is_legal_after_move(mv) {
                nodes += if depth == 1 { 1 } else { self.perft(depth - 1) };
            }
            self.unmake_move(mv, info);
        }
        nodes
    }

    /// Per-root-move leaf counts, in generation order.
    pub fn perft_divide(&mut self, depth: u32) -> Vec<(Move, u64)> {
        let moves = self.generate_moves();
        moves
            .iter()
            .map(|&mv| {
                let info = self.make_move(mv);
                let count = if depth <= 1 { 1 } else { self.perft(depth - 1) };
                self.unmake_move(mv, info);
                (mv, count)
            })
            .collect()
    }
}
