//! Per-perspective hidden-layer accumulators.

use super::network::NnueNetwork;
use super::{feature_index, is_mirrored, simd, HIDDEN_SIZE};
use crate::board::{Board, Color, Piece, Square};

/// Hidden-layer partial sums for one perspective.
#[derive(PartialEq, Eq)]
pub struct Accumulator {
    values: Box<[i16; HIDDEN_SIZE]>,
    mirrored: bool,
}

impl Accumulator {
    fn new(network: &NnueNetwork) -> Self {
        Self {
            values: network.feature_bias.clone(),
            mirrored: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[i16; HIDDEN_SIZE] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }
}

/// White and black perspective accumulators.
#[derive(PartialEq, Eq)]
pub struct AccumulatorPair {
    perspectives: [Accumulator; 2],
}

// Snapshots are copied into the search stack on every move, so `clone_from`
// must reuse the existing allocation.
impl Clone for Accumulator {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            mirrored: self.mirrored,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.values.copy_from_slice(&source.values[..]);
        self.mirrored = source.mirrored;
    }
}

impl Clone for AccumulatorPair {
    fn clone(&self) -> Self {
        Self {
            perspectives: self.perspectives.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        for (dst, src) in self.perspectives.iter_mut().zip(&source.perspectives) {
            dst.clone_from(src);
        }
    }
}

impl AccumulatorPair {
    /// Both perspectives set to the feature bias.
    #[must_use]
    pub fn new(network: &NnueNetwork) -> Self {
        Self {
            perspectives: [Accumulator::new(network), Accumulator::new(network)],
        }
    }

    #[inline]
    #[must_use]
    pub fn perspective(&self, color: Color) -> &Accumulator {
        &self.perspectives[color.index()]
    }

    /// Rebuild both perspectives from the board's piece placement.
    pub fn refresh_all(&mut self, network: &NnueNetwork, board: &Board) {
        for color in Color::BOTH {
            self.refresh(network, board, color);
        }
    }

    /// Rebuild one perspective, re-deriving its mirroring from its king.
    pub fn refresh(&mut self, network: &NnueNetwork, board: &Board, perspective: Color) {
        let mirrored = is_mirrored(board.king_square(perspective));
        let acc = &mut self.perspectives[perspective.index()];
        acc.values.copy_from_slice(&network.feature_bias[..]);
        acc.mirrored = mirrored;

        for color in Color::BOTH {
            for piece in Piece::ALL {
                for sq in board.pieces(color, piece) {
                    let idx = feature_index(perspective, sq, piece, color, mirrored);
                    simd::add_weights(&mut acc.values, &network.feature_weights[idx]);
                }
            }
        }
    }

    /// A piece appeared on `sq`.
    #[inline]
    pub fn add_feature(&mut self, network: &NnueNetwork, color: Color, piece: Piece, sq: Square) {
        for perspective in Color::BOTH {
            let acc = &mut self.perspectives[perspective.index()];
            let idx = feature_index(perspective, sq, piece, color, acc.mirrored);
            simd::add_weights(&mut acc.values, &network.feature_weights[idx]);
        }
    }

    /// A piece left `sq`.
    #[inline]
    pub fn remove_feature(&mut self, network: &NnueNetwork, color: Color, piece: Piece, sq: Square) {
        for perspective in Color::BOTH {
            let acc = &mut self.perspectives[perspective.index()];
            let idx = feature_index(perspective, sq, piece, color, acc.mirrored);
            simd::sub_weights(&mut acc.values, &network.feature_weights[idx]);
        }
    }
}

impl std::fmt::Debug for AccumulatorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatorPair")
            .field("white_mirrored", &self.perspectives[0].mirrored)
            .field("black_mirrored", &self.perspectives[1].mirrored)
            .finish_non_exhaustive()
    }
}
