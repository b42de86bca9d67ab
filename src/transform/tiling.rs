//! Sub-tiles and sheared tiles.
//!
//! A tile is a rectangular sub-domain `[a1, b1) x [a2, b2)` of a larger
//! array. The catalog runs skews and shears over a tile placed away from the
//! array edges, so that every read of the update rule stays inside the array
//! and the bound derivation has to handle nonzero lower bounds.
//!
//! A shear `[[1, r], [0, t]]` slants the outer loop by `r` and, for `t > 1`,
//! spreads the inner loop over every `t`-th value:
//! ```text
//! for i' = a1 + r*a2 to (b1 - 1) + r*(b2 - 1):
//!   for j' = ...:
//!     A[i' - r*j'/t][j'/t] = ...
//! ```

use crate::polyhedral::{IterationDomain, TransformMatrix};
use crate::transform::Transform;
use crate::utils::errors::{MatrixError, RemapResult};
use serde::{Serialize, Deserialize};

/// Placement of a rectangular tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileConfig {
    /// First row (inclusive)
    pub a1: i64,
    /// Last row (exclusive)
    pub b1: i64,
    /// First column (inclusive)
    pub a2: i64,
    /// Last column (exclusive)
    pub b2: i64,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            a1: 4,
            b1: 15,
            a2: 6,
            b2: 19,
        }
    }
}

impl TileConfig {
    /// Create a tile placement.
    pub fn new(a1: i64, b1: i64, a2: i64, b2: i64) -> Self {
        Self { a1, b1, a2, b2 }
    }

    /// The tile as an iteration domain.
    pub fn domain(&self) -> RemapResult<IterationDomain> {
        Ok(IterationDomain::rect(self.a1, self.b1, self.a2, self.b2)?)
    }
}

/// The shear `[[1, r], [0, t]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shear {
    /// Outer slant
    pub r: i64,
    /// Inner stretch
    pub t: i64,
}

impl Shear {
    /// Create a new shear.
    pub fn new(r: i64, t: i64) -> Self {
        Self { r, t }
    }
}

impl Transform for Shear {
    fn name(&self) -> &str {
        "shear"
    }

    fn matrix(&self, dim: usize) -> RemapResult<TransformMatrix> {
        if dim != 2 {
            return Err(MatrixError::dimension_mismatch(2, dim).into());
        }
        Ok(TransformMatrix::from_rows(vec![vec![1, self.r], vec![0, self.t]])?)
    }
}
