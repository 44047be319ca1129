use super::super::attack_tables::king_attacks;
use super::super::{Bitboard, Board, Color, Move, MoveList, Piece, Square};

impl Board {
    pub(super) fn gen_king_moves(&self, list: &mut MoveList, targets: Bitboard) {
        let us = self.side_to_move;
        let from = self.king_square(us);
        self.push_targets(list, from, Piece::King, king_attacks(from) & targets);
    }

    /// Castling with rights held and the path empty. Attacked squares are
    /// checked after the move is made.
    pub(super) fn gen_castling_moves(&self, list: &mut MoveList) {
        let us = self.side_to_move;
        let (king_from, rook_k, rook_q) = match us {
            Color::White => (Square::E1, Square::H1, Square::A1),
            Color::Black => (Square::E8, Square::H8, Square::A8),
        };
        if self.piece_at(king_from) != Some((us, Piece::King)) {
            return;
        }
        let rank = us.back_rank();
        let occ = self.all_occupied;
        let empty = |files: &[usize]| files.iter().all(|&f| !occ.contains(Square::new(rank, f)));

        if self.castling.has(us, true)
            && self.piece_at(rook_k) == Some((us, Piece::Rook))
            && empty(&[5, 6])
        {
            list.push(Move::castle_kingside(king_from, Square::new(rank, 6)));
        }
        if self.castling.has(us, false)
            && self.piece_at(rook_q) == Some((us, Piece::Rook))
            && empty(&[1, 2, 3])
        {
            list.push(Move::castle_queenside(king_from, Square::new(rank, 2)));
        }
    }
}
