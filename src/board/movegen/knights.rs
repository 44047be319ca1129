use super::super::attack_tables::knight_attacks;
use super::super::{Bitboard, Board, Move, MoveList, Piece};

impl Board {
    pub(super) fn gen_knight_moves(&self, list: &mut MoveList, targets: Bitboard) {
        let us = self.side_to_move;
        for from in self.pieces(us, Piece::Knight) {
            self.push_targets(list, from, Piece::Knight, knight_attacks(from) & targets);
        }
    }

    /// Quiet or capture moves from `from` to every square in `targets`.
    #[inline]
    pub(super) fn push_targets(
        &self,
        list: &mut MoveList,
        from: super::super::Square,
        piece: Piece,
        targets: Bitboard,
    ) {
        let enemies = self.occupied[self.side_to_move.opponent().index()];
        for to in targets {
            if enemies.contains(to) {
                list.push(Move::capture(from, to, piece));
            } else {
                list.push(Move::quiet(from, to, piece));
            }
        }
    }
}
