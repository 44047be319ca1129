//! NNUE (Efficiently Updatable Neural Network) evaluation.
//!
//! Provides neural network based position evaluation with:
//! - Incremental accumulator updates, rebuilt per perspective when a king
//!   changes board half
//! - SIMD-optimized inference (AVX2/NEON) with a bit-identical scalar path
//! - `SCReLU` activation function
//!
//! Architecture: (768 -> 1024) x 2 perspectives -> 1

mod accumulator;
mod network;
pub(crate) mod simd;

use std::fmt;
use std::io;
use std::path::PathBuf;

pub use accumulator::{Accumulator, AccumulatorPair};
pub use network::NnueNetwork;

use super::{Color, Piece, Square};

/// Input feature size: 64 squares × 6 piece types × 2 colors
pub const INPUT_SIZE: usize = 768;

/// Hidden layer size (must match trained network)
pub const HIDDEN_SIZE: usize = 1024;

/// Weight quantization factor for feature weights
pub const QA: i32 = 255;

/// Output weight quantization factor
pub const QB: i32 = 64;

/// Evaluation scale factor
pub const SCALE: i32 = 400;

/// Number of i16 values in a weight file.
pub const FILE_VALUES: usize = INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + 2 * HIDDEN_SIZE + 1;

/// Input feature for a piece seen from `perspective`.
///
/// Black's view flips the board vertically; a mirrored view also flips it
/// horizontally. Own pieces occupy the first 384 features.
#[inline]
#[must_use]
pub fn feature_index(perspective: Color, sq: Square, piece: Piece, color: Color, mirrored: bool) -> usize {
    let mut oriented = sq.index();
    if perspective == Color::Black {
        oriented ^= 56;
    }
    if mirrored {
        oriented ^= 7;
    }
    let relation = usize::from(color != perspective);
    relation * 384 + piece.index() * 64 + oriented
}

/// A perspective is mirrored while its king stands on files e-h.
#[inline]
#[must_use]
pub fn is_mirrored(king_sq: Square) -> bool {
    king_sq.file() >= 4
}

/// Error loading a weight file.
#[derive(Debug)]
pub enum NnueError {
    /// The file could not be read
    Io { path: PathBuf, source: io::Error },
    /// Fewer bytes than the architecture needs
    Truncated { expected: usize, found: usize },
    /// Bytes left over after the output bias
    TrailingData { extra: usize },
}

impl fmt::Display for NnueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NnueError::Io { path, source } => {
                write!(f, "cannot read network '{}': {source}", path.display())
            }
            NnueError::Truncated { expected, found } => {
                write!(f, "network file truncated: expected {expected} bytes, found {found}")
            }
            NnueError::TrailingData { extra } => {
                write!(f, "network file has {extra} unexpected trailing bytes")
            }
        }
    }
}

impl std::error::Error for NnueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NnueError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
