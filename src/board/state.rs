use std::fmt;
use std::sync::Arc;

use crate::zobrist;

use super::attack_tables::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use super::nnue::{AccumulatorPair, NnueNetwork};
use super::{Bitboard, CastlingRights, Color, Piece, Square};

/// State needed to take back a move made with [`Board::make_move`].
#[derive(Clone, Debug)]
pub struct UnmakeInfo {
    pub(crate) captured: Option<Piece>,
    pub(crate) previous_en_passant: Option<Square>,
    pub(crate) previous_castling: CastlingRights,
    pub(crate) previous_halfmove_clock: u32,
    pub(crate) previous_hash: u64,
    pub(crate) previous_pawn_key: u64,
    pub(crate) previous_non_pawn_key: [u64; 2],
    pub(crate) previous_minor_key: u64,
    pub(crate) previous_last_irreversible: usize,
}

/// State needed to take back a null move.
#[derive(Clone, Debug)]
pub struct NullMoveInfo {
    pub(crate) previous_en_passant: Option<Square>,
    pub(crate) previous_hash: u64,
    pub(crate) previous_last_irreversible: usize,
}

/// Evaluator state carried by a board once a network is attached.
#[derive(Clone)]
pub(crate) struct NnueState {
    pub(crate) network: Arc<NnueNetwork>,
    pub(crate) acc: AccumulatorPair,
}

#[derive(Clone)]
pub struct Board {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) occupied: [Bitboard; 2],
    pub(crate) all_occupied: Bitboard,
    pub(crate) mailbox: [Option<(Color, Piece)>; 64],
    pub(crate) side_to_move: Color,
    pub(crate) en_passant: Option<Square>,
    pub(crate) castling: CastlingRights,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
    /// Pawns of both colors
    pub(crate) pawn_key: u64,
    /// Every non-pawn piece of each color, king included
    pub(crate) non_pawn_key: [u64; 2],
    /// Knights, bishops and kings of both colors
    pub(crate) minor_key: u64,
    /// Hash of every earlier position, oldest first
    pub(crate) history: Vec<u64>,
    /// Index into `history` of the first position after the last capture,
    /// pawn move or null move
    pub(crate) last_irreversible: usize,
    pub(crate) nnue: Option<Box<NnueState>>,
}

pub(crate) const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// The standard starting position.
    #[must_use]
    pub fn new() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back_rank.iter().enumerate() {
            board.add_piece(Color::White, *piece, Square::new(0, file));
            board.add_piece(Color::Black, *piece, Square::new(7, file));
            board.add_piece(Color::White, Piece::Pawn, Square::new(1, file));
            board.add_piece(Color::Black, Piece::Pawn, Square::new(6, file));
        }
        board.castling = CastlingRights::all();
        board.hash = board.compute_hash();
        board
    }

    pub(crate) fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            mailbox: [None; 64],
            side_to_move: Color::White,
            en_passant: None,
            castling: CastlingRights::none(),
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            pawn_key: 0,
            non_pawn_key: [0; 2],
            minor_key: 0,
            history: Vec::with_capacity(256),
            last_irreversible: 0,
            nnue: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn pawn_key(&self) -> u64 {
        self.pawn_key
    }

    #[inline]
    #[must_use]
    pub fn non_pawn_key(&self, color: Color) -> u64 {
        self.non_pawn_key[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn minor_key(&self) -> u64 {
        self.minor_key
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        self.mailbox[sq.index()]
    }

    #[inline]
    #[must_use]
    pub fn pieces(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupancy(&self) -> Bitboard {
        self.all_occupied
    }

    #[inline]
    #[must_use]
    pub fn color_occupancy(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    /// Both colors' pieces of one type
    #[inline]
    #[must_use]
    pub(crate) fn piece_bb(&self, piece: Piece) -> Bitboard {
        self.pieces[0][piece.index()] | self.pieces[1][piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces(color, Piece::King).lsb()
    }

    // ========================================================================
    // Piece placement (keeps hashes and evaluator in sync)
    // ========================================================================

    #[inline]
    fn toggle_keys(&mut self, color: Color, piece: Piece, sq: Square) {
        let key = zobrist::piece_key(color, piece, sq);
        self.hash ^= key;
        match piece {
            Piece::Pawn => self.pawn_key ^= key,
            Piece::Knight | Piece::Bishop | Piece::King => {
                self.non_pawn_key[color.index()] ^= key;
                self.minor_key ^= key;
            }
            Piece::Rook | Piece::Queen => self.non_pawn_key[color.index()] ^= key,
        }
    }

    pub(crate) fn add_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bit = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bit;
        self.occupied[color.index()] |= bit;
        self.all_occupied |= bit;
        self.mailbox[sq.index()] = Some((color, piece));
        self.toggle_keys(color, piece, sq);
        if let Some(state) = self.nnue.as_deref_mut() {
            state.acc.add_feature(&state.network, color, piece, sq);
        }
    }

    pub(crate) fn remove_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bit = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] &= !bit;
        self.occupied[color.index()] &= !bit;
        self.all_occupied &= !bit;
        self.mailbox[sq.index()] = None;
        self.toggle_keys(color, piece, sq);
        if let Some(state) = self.nnue.as_deref_mut() {
            state.acc.remove_feature(&state.network, color, piece, sq);
        }
    }

    #[inline]
    pub(crate) fn move_piece(&mut self, color: Color, piece: Piece, from: Square, to: Square) {
        self.remove_piece(color, piece, from);
        self.add_piece(color, piece, to);
    }

    // ========================================================================
    // Hashing from scratch
    // ========================================================================

    /// Full position hash recomputed from the piece placement.
    #[must_use]
    pub fn compute_hash(&self) -> u64 {
        let mut hash = 0;
        for (idx, entry) in self.mailbox.iter().enumerate() {
            if let Some((color, piece)) = *entry {
                hash ^= zobrist::piece_key(color, piece, Square::from_index(idx));
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= zobrist::side_key();
        }
        hash ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.en_passant {
            hash ^= zobrist::en_passant_key(ep);
        }
        hash
    }

    /// `(pawn, [non-pawn white, non-pawn black], minor)` recomputed from scratch.
    #[must_use]
    pub fn compute_sub_keys(&self) -> (u64, [u64; 2], u64) {
        let mut scratch = Board::empty();
        for (idx, entry) in self.mailbox.iter().enumerate() {
            if let Some((color, piece)) = *entry {
                scratch.toggle_keys(color, piece, Square::from_index(idx));
            }
        }
        (scratch.pawn_key, scratch.non_pawn_key, scratch.minor_key)
    }

    // ========================================================================
    // Attacks
    // ========================================================================

    /// Pieces of both colors attacking `sq` given `occupancy`.
    #[must_use]
    pub fn attackers_to(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        let white_pawns = self.pieces(Color::White, Piece::Pawn);
        let black_pawns = self.pieces(Color::Black, Piece::Pawn);
        let diagonal = self.piece_bb(Piece::Bishop) | self.piece_bb(Piece::Queen);
        let straight = self.piece_bb(Piece::Rook) | self.piece_bb(Piece::Queen);

        (pawn_attacks(Color::Black, sq) & white_pawns)
            | (pawn_attacks(Color::White, sq) & black_pawns)
            | (knight_attacks(sq) & self.piece_bb(Piece::Knight))
            | (king_attacks(sq) & self.piece_bb(Piece::King))
            | (bishop_attacks(sq, occupancy) & diagonal)
            | (rook_attacks(sq, occupancy) & straight)
    }

    #[inline]
    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        (self.attackers_to(sq, self.all_occupied) & self.occupied[by.index()]).any()
    }

    /// Every square attacked by `color`.
    #[must_use]
    pub fn attacked_by(&self, color: Color) -> Bitboard {
        let occ = self.all_occupied;
        let mut attacks = Bitboard::EMPTY;
        for sq in self.pieces(color, Piece::Pawn) {
            attacks |= pawn_attacks(color, sq);
        }
        for sq in self.pieces(color, Piece::Knight) {
            attacks |= knight_attacks(sq);
        }
        for sq in self.pieces(color, Piece::Bishop) | self.pieces(color, Piece::Queen) {
            attacks |= bishop_attacks(sq, occ);
        }
        for sq in self.pieces(color, Piece::Rook) | self.pieces(color, Piece::Queen) {
            attacks |= rook_attacks(sq, occ);
        }
        for sq in self.pieces(color, Piece::King) {
            attacks |= king_attacks(sq);
        }
        attacks
    }

    /// True if the side to move is in check.
    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        let us = self.side_to_move;
        self.is_square_attacked(self.king_square(us), us.opponent())
    }

    // ========================================================================
    // Draw detection
    // ========================================================================

    /// True if the current position occurred before since the last
    /// irreversible move.
    #[must_use]
    pub fn is_repetition(&self) -> bool {
        let len = self.history.len();
        let mut idx = len;
        while idx >= self.last_irreversible + 2 {
            idx -= 2;
            if self.history[idx] == self.hash {
                return true;
            }
        }
        false
    }

    #[inline]
    #[must_use]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// No pawns, rooks or queens, and at most one minor piece in total or
    /// exactly one bishop per side.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.piece_bb(Piece::Pawn) | self.piece_bb(Piece::Rook) | self.piece_bb(Piece::Queen);
        if heavy.any() {
            return false;
        }

        let minors = (self.piece_bb(Piece::Knight) | self.piece_bb(Piece::Bishop)).popcount();
        if minors <= 1 {
            return true;
        }

        minors == 2
            && self.pieces(Color::White, Piece::Bishop).popcount() == 1
            && self.pieces(Color::Black, Piece::Bishop).popcount() == 1
    }

    #[inline]
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_insufficient_material() || self.is_repetition()
    }

    /// True if `color` has nothing but its king and pawns.
    #[inline]
    #[must_use]
    pub fn only_king_and_pawns(&self, color: Color) -> bool {
        self.occupied[color.index()]
            == self.pieces(color, Piece::King) | self.pieces(color, Piece::Pawn)
    }

    // ========================================================================
    // Evaluator
    // ========================================================================

    /// Attach a network and build both accumulators from scratch.
    pub fn set_network(&mut self, network: Arc<NnueNetwork>) {
        let mut acc = AccumulatorPair::new(&network);
        acc.refresh_all(&network, self);
        self.nnue = Some(Box::new(NnueState { network, acc }));
    }

    #[must_use]
    pub fn network(&self) -> Option<&Arc<NnueNetwork>> {
        self.nnue.as_deref().map(|s| &s.network)
    }

    /// Current accumulator pair, if a network is attached.
    #[must_use]
    pub fn accumulator(&self) -> Option<&AccumulatorPair> {
        self.nnue.as_deref().map(|s| &s.acc)
    }

    pub(crate) fn restore_accumulator(&mut self, snapshot: &AccumulatorPair) {
        if let Some(state) = self.nnue.as_deref_mut() {
            state.acc.clone_from(snapshot);
        }
    }

    /// Network evaluation from the side to move's point of view. A board
    /// without a network evaluates by material.
    #[must_use]
    pub fn evaluate(&self) -> i32 {
        match self.nnue.as_deref() {
            Some(state) => state.network.evaluate(&state.acc, self.side_to_move),
            None => self.material_eval(),
        }
    }

    /// Plain material balance from the side to move's point of view.
    #[must_use]
    pub fn material_eval(&self) -> i32 {
        const VALUES: [i32; 5] = [100, 300, 300, 500, 900];
        let us = self.side_to_move;
        let them = us.opponent();
        VALUES
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let piece = Piece::from_index(idx);
                let diff = self.pieces(us, piece).popcount() as i32
                    - self.pieces(them, piece).popcount() as i32;
                diff * value
            })
            .sum()
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl PartialEq for Board {
    /// Positions compare equal when placement, rights, counters, keys and
    /// accumulators all agree. Game history is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
            && self.occupied == other.occupied
            && self.all_occupied == other.all_occupied
            && self.mailbox == other.mailbox
            && self.side_to_move == other.side_to_move
            && self.en_passant == other.en_passant
            && self.castling == other.castling
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.hash == other.hash
            && self.pawn_key == other.pawn_key
            && self.non_pawn_key == other.non_pawn_key
            && self.minor_key == other.minor_key
            && self.accumulator() == other.accumulator()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({})", self.to_fen())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let c = match self.piece_at(Square::new(rank, file)) {
                    Some((color, piece)) => piece.to_fen_char(color),
                    None => '.',
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "fen: {}", self.to_fen())
    }
}
