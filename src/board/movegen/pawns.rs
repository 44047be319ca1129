use super::super::attack_tables::pawn_attacks;
use super::super::{Bitboard, Board, Color, Move, MoveList, Piece, Square, PROMOTION_PIECES};

impl Board {
    /// Pawn pushes, captures, promotions and en passant. With `noisy_only`,
    /// quiet pushes are skipped but every promotion is kept.
    pub(super) fn gen_pawn_moves(&self, list: &mut MoveList, noisy_only: bool) {
        let us = self.side_to_move;
        let them = us.opponent();
        let pawns = self.pieces(us, Piece::Pawn);
        let empty = !self.all_occupied;
        let enemies = self.occupied[them.index()];
        let (promo_rank, double_rank, up): (Bitboard, Bitboard, isize) = match us {
            Color::White => (Bitboard::RANK_8, Bitboard::RANK_4, 8),
            Color::Black => (Bitboard::RANK_1, Bitboard::RANK_5, -8),
        };

        let advance = |bb: Bitboard| match us {
            Color::White => bb.shift_north(),
            Color::Black => bb.shift_south(),
        };
        let origin = |to: Square, steps: isize| Square::from_index((to.index() as isize - up * steps) as usize);

        let single = advance(pawns) & empty;
        for to in single & promo_rank {
            for promo in PROMOTION_PIECES {
                list.push(Move::promotion(origin(to, 1), to, promo, false));
            }
        }
        if !noisy_only {
            for to in single & !promo_rank {
                list.push(Move::quiet(origin(to, 1), to, Piece::Pawn));
            }
            let double = advance(single) & empty & double_rank;
            for to in double {
                list.push(Move::double_pawn_push(origin(to, 2), to));
            }
        }

        for from in pawns {
            let attacks = pawn_attacks(us, from);
            for to in attacks & enemies {
                if promo_rank.contains(to) {
                    for promo in PROMOTION_PIECES {
                        list.push(Move::promotion(from, to, promo, true));
                    }
                } else {
                    list.push(Move::capture(from, to, Piece::Pawn));
                }
            }
            if let Some(ep) = self.en_passant {
                if attacks.contains(ep) {
                    list.push(Move::en_passant(from, ep));
                }
            }
        }
    }
}
