//! Attack tables for move generation.
//!
//! Uses Hyperbola Quintessence for sliding piece attacks (bishop, rook, queen).
//! This is a fast, branch-free algorithm that uses the `o^(o-2r)` trick.

#![allow(clippy::needless_range_loop)] // Index loops are clearer for board coordinates
#![allow(clippy::inline_always)] // Performance-critical hot path functions

mod tables;

use std::sync::LazyLock;

use tables::{KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS};

use super::types::{Bitboard, Color, Piece, Square};

// File mask for column A
const FILE_A: u64 = 0x0101010101010101;

/// Diagonal masks for each square (bottom-left to top-right direction)
static DIAG_MASKS: LazyLock<[u64; 64]> = LazyLock::new(|| {
    let mut masks = [0u64; 64];
    for sq in 0..64 {
        let rank = sq / 8;
        let file = sq % 8;
        let mut mask = 0u64;
        // Go in both directions along the diagonal
        let mut r = rank as isize;
        let mut f = file as isize;
        while r < 8 && f < 8 {
            mask |= 1u64 << (r * 8 + f);
            r += 1;
            f += 1;
        }
        r = rank as isize - 1;
        f = file as isize - 1;
        while r >= 0 && f >= 0 {
            mask |= 1u64 << (r * 8 + f);
            r -= 1;
            f -= 1;
        }
        masks[sq] = mask;
    }
    masks
});

/// Anti-diagonal masks for each square (top-left to bottom-right direction)
static ANTI_MASKS: LazyLock<[u64; 64]> = LazyLock::new(|| {
    let mut masks = [0u64; 64];
    for sq in 0..64 {
        let rank = sq / 8;
        let file = sq % 8;
        let mut mask = 0u64;
        // Go in both directions along the anti-diagonal
        let mut r = rank as isize;
        let mut f = file as isize;
        while r < 8 && f >= 0 {
            mask |= 1u64 << (r * 8 + f);
            r += 1;
            f -= 1;
        }
        r = rank as isize - 1;
        f = file as isize + 1;
        while r >= 0 && f < 8 {
            mask |= 1u64 << (r * 8 + f);
            r -= 1;
            f += 1;
        }
        masks[sq] = mask;
    }
    masks
});

/// File masks for each square
static FILE_MASKS: LazyLock<[u64; 64]> = LazyLock::new(|| {
    let mut masks = [0u64; 64];
    for sq in 0..64 {
        let file = sq % 8;
        masks[sq] = FILE_A << file;
    }
    masks
});

/// Rank attack lookup table: `[8 * occupancy_6bit + file]` -> attacks on that rank
/// Only stores attacks for file positions, shifted to rank 0
static RANK_ATTACKS: LazyLock<[u64; 512]> = LazyLock::new(|| {
    let mut attacks = [0u64; 512];
    for occ_6bit in 0..64 {
        for file in 0..8 {
            let mut attack = 0u64;
            // Attacks to the right (increasing file)
            for f in (file + 1)..8 {
                attack |= 1u64 << f;
                // Check if blocked (occupancy is bits 1-6, representing files b-g)
                if (1..=6).contains(&f) && (occ_6bit & (1 << (f - 1))) != 0 {
                    break;
                }
            }
            // Attacks to the left (decreasing file)
            for f in (0..file).rev() {
                attack |= 1u64 << f;
                // Check if blocked
                if (1..=6).contains(&f) && (occ_6bit & (1 << (f - 1))) != 0 {
                    break;
                }
            }
            attacks[8 * occ_6bit + file] = attack;
        }
    }
    attacks
});

/// Byteswap - reverses the order of bytes (flips board vertically)
#[inline(always)]
const fn byteswap(x: u64) -> u64 {
    x.swap_bytes()
}

/// Hyperbola Quintessence attack calculation for a single ray direction.
/// Uses the o^(o-2r) trick with byteswap for the reverse direction.
#[inline(always)]
fn hyp_quint(occupied: u64, mask: u64, square: usize) -> u64 {
    let piece_bit = 1u64 << square;
    let forward = occupied & mask;
    let backward = byteswap(forward);
    let forward_attacks = forward.wrapping_sub(piece_bit.wrapping_mul(2));
    let backward_attacks = byteswap(backward.wrapping_sub(byteswap(piece_bit).wrapping_mul(2)));
    (forward_attacks ^ backward_attacks) & mask
}

/// Diagonal attacks (bottom-left to top-right)
#[inline(always)]
fn diag_attacks(occupied: u64, square: usize) -> u64 {
    hyp_quint(occupied, DIAG_MASKS[square], square)
}

/// Anti-diagonal attacks (top-left to bottom-right)
#[inline(always)]
fn anti_attacks(occupied: u64, square: usize) -> u64 {
    hyp_quint(occupied, ANTI_MASKS[square], square)
}

/// File attacks (vertical)
#[inline(always)]
fn file_attacks(occupied: u64, square: usize) -> u64 {
    hyp_quint(occupied, FILE_MASKS[square], square)
}

/// Rank attacks (horizontal) - uses lookup table since byteswap doesn't help
#[inline(always)]
fn rank_attacks(occupied: u64, square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let rank_occ = occupied >> (rank * 8);
    // Extract bits 1-6 (files b-g) as the relevant occupancy
    let occ_6bit = ((rank_occ >> 1) & 63) as usize;
    RANK_ATTACKS[8 * occ_6bit + file] << (rank * 8)
}

/// Bishop attacks (diagonals only)
#[inline]
#[must_use]
pub(crate) fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let s = sq.index();
    Bitboard(diag_attacks(occupancy.0, s) | anti_attacks(occupancy.0, s))
}

/// Rook attacks (ranks and files only)
#[inline]
#[must_use]
pub(crate) fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let s = sq.index();
    Bitboard(file_attacks(occupancy.0, s) | rank_attacks(occupancy.0, s))
}

/// Queen attacks (all 8 directions)
#[inline]
#[must_use]
pub(crate) fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupancy) | rook_attacks(sq, occupancy)
}

#[inline]
#[must_use]
pub(crate) fn knight_attacks(sq: Square) -> Bitboard {
    Bitboard(KNIGHT_ATTACKS[sq.index()])
}

#[inline]
#[must_use]
pub(crate) fn king_attacks(sq: Square) -> Bitboard {
    Bitboard(KING_ATTACKS[sq.index()])
}

/// Squares attacked by a pawn of `color` standing on `sq`
#[inline]
#[must_use]
pub(crate) fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    Bitboard(PAWN_ATTACKS[color.index()][sq.index()])
}

/// Attacks of any non-pawn piece type from `sq` given `occupancy`.
#[inline]
#[must_use]
pub(crate) fn piece_attacks(piece: Piece, sq: Square, occupancy: Bitboard) -> Bitboard {
    match piece {
        Piece::Knight => knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occupancy),
        Piece::Rook => rook_attacks(sq, occupancy),
        Piece::Queen => queen_attacks(sq, occupancy),
        Piece::King => king_attacks(sq),
        Piece::Pawn => Bitboard::EMPTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_rook_attacks_empty_board() {
        let attacks = rook_attacks(sq("e4"), Bitboard::EMPTY);
        let expected = ((0xFFu64 << 24) | (FILE_A << 4)) & !(1u64 << 28);
        assert_eq!(attacks.0, expected);
    }

    #[test]
    fn test_bishop_attacks_empty_board() {
        let attacks = bishop_attacks(sq("e4"), Bitboard::EMPTY);
        for target in ["b1", "h7", "h1", "a8"] {
            assert!(attacks.contains(sq(target)), "missing {target}");
        }
        assert!(!attacks.contains(sq("e4")));
        assert_eq!(attacks.popcount(), 13);
    }

    #[test]
    fn test_rook_attacks_with_blockers() {
        let blockers = Bitboard::from_square(sq("e6")) | Bitboard::from_square(sq("c4"));
        let attacks = rook_attacks(sq("e4"), blockers);
        assert!(attacks.contains(sq("e6")));
        assert!(!attacks.contains(sq("e7")));
        assert!(attacks.contains(sq("c4")));
        assert!(!attacks.contains(sq("b4")));
    }

    #[test]
    fn test_bishop_attacks_with_blockers() {
        let attacks = bishop_attacks(sq("e4"), Bitboard::from_square(sq("g6")));
        assert!(attacks.contains(sq("g6")));
        assert!(!attacks.contains(sq("h7")));
    }

    #[test]
    fn test_leaper_tables() {
        assert_eq!(knight_attacks(sq("a1")).popcount(), 2);
        assert_eq!(knight_attacks(sq("d4")).popcount(), 8);
        assert_eq!(king_attacks(sq("h8")).popcount(), 3);
        let white = pawn_attacks(Color::White, sq("a2"));
        assert_eq!(white, Bitboard::from_square(sq("b3")));
        let black = pawn_attacks(Color::Black, sq("e5"));
        assert!(black.contains(sq("d4")) && black.contains(sq("f4")));
    }

    #[test]
    fn test_queen_is_union() {
        for idx in [0usize, 27, 36, 63] {
            let s = Square::from_index(idx);
            for occ in [0u64, 0xFF00FF00FF00FF00, 0x00FF00FF00FF00FF] {
                let occ = Bitboard(occ);
                assert_eq!(
                    queen_attacks(s, occ),
                    rook_attacks(s, occ) | bishop_attacks(s, occ)
                );
            }
        }
    }
}
