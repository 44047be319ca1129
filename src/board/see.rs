//! Static Exchange Evaluation (SEE).
//!
//! Answers whether the exchange sequence started by a move on its target
//! square wins at least a given amount of material, assuming both sides
//! always recapture with their least valuable attacker.

use super::attack_tables::{bishop_attacks, rook_attacks};
use super::state::Board;
use super::types::{Bitboard, Color, Move, Piece};

/// Default exchange values, indexed by piece. The king is worth nothing so a
/// king recapture only counts when it is safe.
pub const SEE_VALUES: [i32; 6] = [100, 300, 300, 500, 900, 0];

impl Board {
    /// The piece a move removes from the board, if any.
    #[inline]
    #[must_use]
    pub fn captured_piece(&self, mv: Move) -> Option<Piece> {
        if mv.is_en_passant() {
            Some(Piece::Pawn)
        } else if mv.is_castling() {
            None
        } else {
            self.piece_at(mv.to()).map(|(_, p)| p)
        }
    }

    /// Material the move itself gains before any recapture.
    fn move_gain(&self, mv: Move, values: &[i32; 6]) -> i32 {
        let mut gain = self.captured_piece(mv).map_or(0, |p| values[p.index()]);
        if let Some(promo) = mv.promotion_piece() {
            gain += values[promo.index()] - values[Piece::Pawn.index()];
        }
        gain
    }

    /// True if `mv` wins at least `threshold` after the best sequence of
    /// recaptures on its target square.
    #[must_use]
    pub fn see(&self, mv: Move, threshold: i32, values: &[i32; 6]) -> bool {
        if mv.is_castling() {
            return threshold <= 0;
        }

        let from = mv.from();
        let to = mv.to();
        let us = self.side_to_move;

        let mut balance = self.move_gain(mv, values) - threshold;
        if balance < 0 {
            return false;
        }

        let moved = mv.promotion_piece().unwrap_or_else(|| mv.piece());
        balance -= values[moved.index()];
        if balance >= 0 {
            return true;
        }

        let mut occupied = self.all_occupied ^ Bitboard::from_square(from) ^ Bitboard::from_square(to);
        if mv.is_en_passant() {
            let victim = match us {
                Color::White => to.index() - 8,
                Color::Black => to.index() + 8,
            };
            occupied ^= Bitboard(1u64 << victim);
        }

        let diagonal = self.piece_bb(Piece::Bishop) | self.piece_bb(Piece::Queen);
        let straight = self.piece_bb(Piece::Rook) | self.piece_bb(Piece::Queen);

        let mut attackers = self.attackers_to(to, occupied) & occupied;
        let mut side = us.opponent();

        loop {
            let ours = attackers & self.occupied[side.index()];
            if ours.is_empty() {
                break;
            }

            let Some(attacker) = Piece::ALL
                .into_iter()
                .find(|&p| (ours & self.pieces(side, p)).any())
            else {
                break;
            };

            side = side.opponent();
            balance = -balance - 1 - values[attacker.index()];
            if balance >= 0 {
                // A king cannot recapture into a defended square.
                if attacker == Piece::King && (attackers & self.occupied[side.index()]).any() {
                    side = side.opponent();
                }
                break;
            }

            occupied ^= Bitboard::from_square((ours & self.pieces(side.opponent(), attacker)).lsb());

            if matches!(attacker, Piece::Pawn | Piece::Bishop | Piece::Queen) {
                attackers |= bishop_attacks(to, occupied) & diagonal;
            }
            if matches!(attacker, Piece::Rook | Piece::Queen) {
                attackers |= rook_attacks(to, occupied) & straight;
            }
            attackers &= occupied;
        }

        side != us
    }

    /// [`Board::see`] with the default piece values.
    #[inline]
    #[must_use]
    pub fn see_ge(&self, mv: Move, threshold: i32) -> bool {
        self.see(mv, threshold, &SEE_VALUES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(board: &mut Board, uci: &str) -> Move {
        board.parse_uci_move(uci).expect("legal move")
    }

    #[test]
    fn test_see_simple_capture() {
        let mut board = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let mv = capture(&mut board, "e4d5");
        assert!(board.see_ge(mv, 100));
        assert!(!board.see_ge(mv, 101));
    }

    #[test]
    fn test_see_even_trade() {
        let mut board = Board::from_fen("4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1");
        let mv = capture(&mut board, "e4d5");
        assert!(board.see_ge(mv, 0));
        assert!(!board.see_ge(mv, 1));
    }

    #[test]
    fn test_see_queen_takes_defended_pawn() {
        let mut board = Board::from_fen("4k3/8/2p5/3p4/4Q3/8/8/4K3 w - - 0 1");
        let mv = capture(&mut board, "e4d5");
        assert!(!board.see_ge(mv, 0));
        assert!(board.see_ge(mv, -800));
        assert!(!board.see_ge(mv, -799));
    }

    #[test]
    fn test_see_castling_is_neutral() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        let mv = capture(&mut board, "e1g1");
        assert!(board.see_ge(mv, 0));
        assert!(!board.see_ge(mv, 1));
    }
}
