//! Zobrist hashing for chess positions.
//!
//! Provides the random keys behind the incrementally-updated position hash and
//! the structural sub-keys (pawn, non-pawn, minor) that index correction history.

use std::sync::LazyLock;

use rand::prelude::*;

use crate::board::{CastlingRights, Color, Piece, Square};

pub(crate) struct ZobristKeys {
    /// `piece_keys[piece_type][color][square]`
    pub(crate) piece_keys: [[[u64; 64]; 2]; 6],
    pub(crate) black_to_move_key: u64,
    /// One key per castling-right bit (WK, WQ, BK, BQ)
    pub(crate) castling_keys: [u64; 4],
    /// `en_passant_keys[file]` (only the file matters for the EP target)
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed keeps hashes reproducible across runs and threads.
        let mut rng = StdRng::seed_from_u64(1234567890_u64);
        let mut piece_keys = [[[0; 64]; 2]; 6];
        for piece in &mut piece_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let black_to_move_key = rng.gen();

        let mut castling_keys = [0; 4];
        for key in &mut castling_keys {
            *key = rng.gen();
        }

        let mut en_passant_keys = [0; 8];
        for key in &mut en_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            black_to_move_key,
            castling_keys,
            en_passant_keys,
        }
    }
}

pub(crate) static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

#[inline]
pub(crate) fn piece_key(color: Color, piece: Piece, sq: Square) -> u64 {
    ZOBRIST.piece_keys[piece.index()][color.index()][sq.index()]
}

#[inline]
pub(crate) fn side_key() -> u64 {
    ZOBRIST.black_to_move_key
}

/// XOR of the keys of every right set in `rights`
#[inline]
pub(crate) fn castling_key(rights: CastlingRights) -> u64 {
    let bits = rights.as_u8();
    let mut key = 0;
    for (i, k) in ZOBRIST.castling_keys.iter().enumerate() {
        if bits & (1 << i) != 0 {
            key ^= k;
        }
    }
    key
}

#[inline]
pub(crate) fn en_passant_key(sq: Square) -> u64 {
    ZOBRIST.en_passant_keys[sq.file()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let a = piece_key(Color::White, Piece::Pawn, Square::A1);
        let b = piece_key(Color::Black, Piece::Pawn, Square::A1);
        let c = piece_key(Color::White, Piece::Knight, Square::A1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(side_key(), 0);
    }

    #[test]
    fn test_castling_key_is_xor_of_bits() {
        let all = castling_key(CastlingRights::all());
        let folded = ZOBRIST.castling_keys.iter().fold(0, |acc, k| acc ^ k);
        assert_eq!(all, folded);
        assert_eq!(castling_key(CastlingRights::none()), 0);
    }
}
