//! Precomputed attack tables for leaper pieces (knights, kings, pawns).

use std::sync::LazyLock;

const KNIGHT_DELTAS: [(isize, isize); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

const KING_DELTAS: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Build a 64-entry table from (rank, file) offsets, dropping off-board targets.
fn leaper_table(deltas: &[(isize, isize)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    for (sq, slot) in table.iter_mut().enumerate() {
        let r = (sq / 8) as isize;
        let f = (sq % 8) as isize;
        for &(dr, df) in deltas {
            let (nr, nf) = (r + dr, f + df);
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                *slot |= 1u64 << (nr * 8 + nf);
            }
        }
    }
    table
}

pub(crate) static KNIGHT_ATTACKS: LazyLock<[u64; 64]> =
    LazyLock::new(|| leaper_table(&KNIGHT_DELTAS));

pub(crate) static KING_ATTACKS: LazyLock<[u64; 64]> = LazyLock::new(|| leaper_table(&KING_DELTAS));

/// `PAWN_ATTACKS[color][square]`: squares a pawn of `color` on `square` attacks
pub(crate) static PAWN_ATTACKS: LazyLock<[[u64; 64]; 2]> = LazyLock::new(|| {
    [
        leaper_table(&[(1, -1), (1, 1)]),
        leaper_table(&[(-1, -1), (-1, 1)]),
    ]
});
