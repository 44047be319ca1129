use super::super::attack_tables::{bishop_attacks, queen_attacks, rook_attacks};
use super::super::{Bitboard, Board, MoveList, Piece};

impl Board {
    pub(super) fn gen_slider_moves(&self, list: &mut MoveList, targets: Bitboard) {
        let us = self.side_to_move;
        let occ = self.all_occupied;
        for from in self.pieces(us, Piece::Bishop) {
            self.push_targets(list, from, Piece::Bishop, bishop_attacks(from, occ) & targets);
        }
        for from in self.pieces(us, Piece::Rook) {
            self.push_targets(list, from, Piece::Rook, rook_attacks(from, occ) & targets);
        }
        for from in self.pieces(us, Piece::Queen) {
            self.push_targets(list, from, Piece::Queen, queen_attacks(from, occ) & targets);
        }
    }
}
