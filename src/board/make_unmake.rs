//! Making and unmaking moves.
//!
//! Every mutation goes through `add_piece`/`remove_piece`, which keep the
//! position hash, the structural sub-keys and the evaluator accumulators in
//! step with the bitboards. Unmake restores the keys from the saved copies.

use crate::zobrist;

use super::nnue::AccumulatorPair;
use super::state::{NullMoveInfo, UnmakeInfo};
use super::{Board, Color, Move, Piece, Square};

/// Rook origin and destination for a castling move landing the king on `king_to`.
#[inline]
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to {
        Square::G1 => (Square::H1, Square::F1),
        Square::C1 => (Square::A1, Square::D1),
        Square::G8 => (Square::H8, Square::F8),
        _ => (Square::A8, Square::D8),
    }
}

/// Square of the pawn taken by an en passant capture landing on `to`.
#[inline]
fn en_passant_victim(us: Color, to: Square) -> Square {
    match us {
        Color::White => Square::from_index(to.index() - 8),
        Color::Black => Square::from_index(to.index() + 8),
    }
}

impl Board {
    /// Apply a pseudo-legal move. The caller checks legality afterwards with
    /// [`Board::is_legal_after_move`].
    pub fn make_move(&mut self, mv: Move) -> UnmakeInfo {
        let us = self.side_to_move;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();

        let captured = if mv.is_en_passant() {
            Some(Piece::Pawn)
        } else {
            self.piece_at(to).map(|(_, p)| p)
        };

        let info = UnmakeInfo {
            captured,
            previous_en_passant: self.en_passant,
            previous_castling: self.castling,
            previous_halfmove_clock: self.halfmove_clock,
            previous_hash: self.hash,
            previous_pawn_key: self.pawn_key,
            previous_non_pawn_key: self.non_pawn_key,
            previous_minor_key: self.minor_key,
            previous_last_irreversible: self.last_irreversible,
        };

        self.history.push(self.hash);

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep);
        }
        self.hash ^= zobrist::castling_key(self.castling);

        if mv.is_en_passant() {
            self.remove_piece(them, Piece::Pawn, en_passant_victim(us, to));
        } else if let Some(victim) = captured {
            self.remove_piece(them, victim, to);
        }

        match mv.promotion_piece() {
            Some(promo) => {
                self.remove_piece(us, Piece::Pawn, from);
                self.add_piece(us, promo, to);
            }
            None => self.move_piece(us, piece, from, to),
        }

        if mv.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(to);
            self.move_piece(us, Piece::Rook, rook_from, rook_to);
        }

        if mv.is_double_pawn_push() {
            let ep = Square::from_index((from.index() + to.index()) / 2);
            self.en_passant = Some(ep);
            self.hash ^= zobrist::en_passant_key(ep);
        }

        self.castling.update_for_move(from, to);
        self.hash ^= zobrist::castling_key(self.castling);

        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
            self.last_irreversible = self.history.len();
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = them;
        self.hash ^= zobrist::side_key();

        if piece == Piece::King {
            self.refresh_if_king_crossed(us, from, to);
        }

        info
    }

    /// Take back a move, reversing the accumulator updates incrementally.
    pub fn unmake_move(&mut self, mv: Move, info: UnmakeInfo) {
        self.undo_placement(mv, &info);
        if mv.piece() == Piece::King {
            self.refresh_if_king_crossed(self.side_to_move, mv.to(), mv.from());
        }
        self.restore_state(info);
    }

    /// Take back a move and copy the accumulators back from a snapshot taken
    /// before the move was made.
    pub fn unmake_move_restoring(&mut self, mv: Move, info: UnmakeInfo, snapshot: &AccumulatorPair) {
        let state = self.nnue.take();
        self.undo_placement(mv, &info);
        self.nnue = state;
        self.restore_accumulator(snapshot);
        self.restore_state(info);
    }

    fn undo_placement(&mut self, mv: Move, info: &UnmakeInfo) {
        let us = self.side_to_move.opponent();
        let them = self.side_to_move;
        let from = mv.from();
        let to = mv.to();

        self.side_to_move = us;

        if mv.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(to);
            self.move_piece(us, Piece::Rook, rook_to, rook_from);
        }

        match mv.promotion_piece() {
            Some(promo) => {
                self.remove_piece(us, promo, to);
                self.add_piece(us, Piece::Pawn, from);
            }
            None => self.move_piece(us, mv.piece(), to, from),
        }

        if mv.is_en_passant() {
            self.add_piece(them, Piece::Pawn, en_passant_victim(us, to));
        } else if let Some(victim) = info.captured {
            self.add_piece(them, victim, to);
        }
    }

    fn restore_state(&mut self, info: UnmakeInfo) {
        if self.side_to_move == Color::Black {
            self.fullmove_number -= 1;
        }
        self.history.pop();
        self.en_passant = info.previous_en_passant;
        self.castling = info.previous_castling;
        self.halfmove_clock = info.previous_halfmove_clock;
        self.hash = info.previous_hash;
        self.pawn_key = info.previous_pawn_key;
        self.non_pawn_key = info.previous_non_pawn_key;
        self.minor_key = info.previous_minor_key;
        self.last_irreversible = info.previous_last_irreversible;
    }

    /// A king crossing the d/e midline changes its side's mirroring, which
    /// invalidates that perspective's accumulator.
    fn refresh_if_king_crossed(&mut self, color: Color, from: Square, to: Square) {
        if (from.file() >= 4) == (to.file() >= 4) {
            return;
        }
        if let Some(mut state) = self.nnue.take() {
            state.acc.refresh(&state.network, self, color);
            self.nnue = Some(state);
        }
    }

    /// Pass the turn. Callers never do this while in check.
    pub fn make_null_move(&mut self) -> NullMoveInfo {
        let info = NullMoveInfo {
            previous_en_passant: self.en_passant,
            previous_hash: self.hash,
            previous_last_irreversible: self.last_irreversible,
        };

        self.history.push(self.hash);
        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep);
        }
        self.side_to_move = self.side_to_move.opponent();
        self.hash ^= zobrist::side_key();
        self.last_irreversible = self.history.len();

        info
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.history.pop();
        self.side_to_move = self.side_to_move.opponent();
        self.en_passant = info.previous_en_passant;
        self.hash = info.previous_hash;
        self.last_irreversible = info.previous_last_irreversible;
    }

    /// Legality check for the move just made: the mover's king is not
    /// attacked, and a castling king did not start on or pass through an
    /// attacked square.
    #[must_use]
    pub fn is_legal_after_move(&self, mv: Move) -> bool {
        let mover = self.side_to_move.opponent();
        let enemy = self.side_to_move;
        if self.is_square_attacked(self.king_square(mover), enemy) {
            return false;
        }
        if mv.is_castling() {
            let (_, transit) = castling_rook_squares(mv.to());
            return !self.is_square_attacked(mv.from(), enemy)
                && !self.is_square_attacked(transit, enemy);
        }
        true
    }

    /// Make `mv` only if it is legal. Returns `None` (with the board
    /// unchanged) otherwise.
    pub fn try_make_move(&mut self, mv: Move) -> Option<UnmakeInfo> {
        let info = self.make_move(mv);
        if self.is_legal_after_move(mv) {
            Some(info)
        } else {
            self.unmake_move(mv, info);
            None
        }
    }
}
