//! NNUE network weights, loading and the forward pass.

use std::fs;
use std::path::Path;

use super::accumulator::AccumulatorPair;
use super::simd;
use super::{NnueError, FILE_VALUES, HIDDEN_SIZE, INPUT_SIZE, QA, QB, SCALE};
use crate::board::Color;

/// Output weight per piece type in the built-in material network.
const MATERIAL_OUTPUT: [i16; 6] = [8, 24, 26, 40, 72, 0];

/// NNUE network weights
#[derive(Clone)]
pub struct NnueNetwork {
    /// Feature transformer weights, one row per input feature
    pub(crate) feature_weights: Box<[[i16; HIDDEN_SIZE]]>,
    pub(crate) feature_bias: Box<[i16; HIDDEN_SIZE]>,
    /// Side-to-move half first, then the opponent half
    pub(crate) output_weights: Box<[[i16; HIDDEN_SIZE]; 2]>,
    pub(crate) output_bias: i16,
}

impl NnueNetwork {
    /// All-zero weights. Evaluates every position as 0.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            feature_weights: vec![[0i16; HIDDEN_SIZE]; INPUT_SIZE].into_boxed_slice(),
            feature_bias: Box::new([0; HIDDEN_SIZE]),
            output_weights: Box::new([[0; HIDDEN_SIZE]; 2]),
            output_bias: 0,
        }
    }

    /// Built-in network used when no weight file is configured.
    ///
    /// Hidden unit `i` copies input feature `i`, and the output layer weighs
    /// each unit by the piece's material value (about 100 cp per pawn).
    #[must_use]
    pub fn material() -> Self {
        let mut net = Self::zeroed();
        for feature in 0..INPUT_SIZE {
            net.feature_weights[feature][feature] = QA as i16;
            let value = MATERIAL_OUTPUT[(feature % 384) / 64];
            let signed = if feature < 384 { value } else { -value };
            net.output_weights[0][feature] = signed;
            net.output_weights[1][feature] = -signed;
        }
        net
    }

    /// Load a weight file: little-endian i16 values, feature weights then
    /// feature bias, output weights, output bias. No header.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NnueError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| NnueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Load a network, falling back to zero weights when the file is unusable.
    #[must_use]
    pub fn load_or_zeroed<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(net) => {
                log::info!("loaded network from {}", path.as_ref().display());
                net
            }
            Err(err) => {
                log::error!("{err}; continuing with zeroed network");
                Self::zeroed()
            }
        }
    }

    /// Parse a network from raw file contents. The length must match exactly.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NnueError> {
        let expected = FILE_VALUES * 2;
        if data.len() < expected {
            return Err(NnueError::Truncated {
                expected,
                found: data.len(),
            });
        }
        if data.len() > expected {
            return Err(NnueError::TrailingData {
                extra: data.len() - expected,
            });
        }

        let mut values = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));
        let mut fill = |dst: &mut [i16]| {
            for (slot, value) in dst.iter_mut().zip(&mut values) {
                *slot = value;
            }
        };

        let mut net = Self::zeroed();
        for row in net.feature_weights.iter_mut() {
            fill(&mut row[..]);
        }
        fill(&mut net.feature_bias[..]);
        for half in net.output_weights.iter_mut() {
            fill(&mut half[..]);
        }
        let mut bias = [0i16; 1];
        fill(&mut bias);
        net.output_bias = bias[0];
        Ok(net)
    }

    /// Evaluate from the side to move's perspective, in centipawns.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, acc: &AccumulatorPair, side_to_move: Color) -> i32 {
        let us = acc.perspective(side_to_move).values();
        let them = acc.perspective(side_to_move.opponent()).values();

        let sum = simd::screlu_dot(us, &self.output_weights[0])
            + simd::screlu_dot(them, &self.output_weights[1]);

        let output = sum / i64::from(QA) + i64::from(self.output_bias);
        (output * i64::from(SCALE) / i64::from(QA * QB)) as i32
    }
}

impl std::fmt::Debug for NnueNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NnueNetwork")
            .field("hidden", &HIDDEN_SIZE)
            .field("output_bias", &self.output_bias)
            .finish_non_exhaustive()
    }
}
