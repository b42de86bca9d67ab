//! Integer lattice arithmetic.
//!
//! The image of `Z^n` under a non-singular integer matrix `T` is a lattice.
//! When `|det T| > 1` it is sparse, and the transformed loop nest must skip
//! the points that are not in it. The Hermite Normal Form `T * U = A` gives a
//! triangular basis of the same lattice, from which the steps and the
//! starting offset of every loop are read off directly.

pub mod hnf;
pub mod smith;

pub use hnf::{hnf, HermiteForm};
pub use smith::{diagonalize, solve_system, DiagonalForm};

use crate::polyhedral::TransformMatrix;
use crate::utils::errors::MatrixError;
use log::debug;
use serde::{Serialize, Deserialize};

/// Step structure of a 2-D image lattice.
///
/// With `A = [[outer_step, 0], [residue, inner_step]]` the lattice is
/// `{ (outer_step * k, residue * k + inner_step * m) }`, so for an outer value
/// `i = outer_step * k` the inner values are exactly those congruent to
/// `residue * k` modulo `inner_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeSteps {
    /// Stride of the outer loop
    pub outer_step: i64,
    /// Inner residue per outer stride
    pub residue: i64,
    /// Stride of the inner loop
    pub inner_step: i64,
}

impl LatticeSteps {
    /// The dense lattice `Z^2`.
    pub fn dense() -> Self {
        Self {
            outer_step: 1,
            residue: 0,
            inner_step: 1,
        }
    }

    /// Read the steps of a 2-D transform's image lattice.
    pub fn of(transform: &TransformMatrix) -> Result<Self, MatrixError> {
        if transform.dim() != 2 {
            return Err(MatrixError::dimension_mismatch(2, transform.dim()));
        }
        if transform.is_unimodular() {
            return Ok(Self::dense());
        }
        let form = hnf(transform.matrix())?;
        let steps = Self {
            outer_step: form.diagonal(0),
            residue: form.triangular[(1, 0)],
            inner_step: form.diagonal(1),
        };
        debug!("lattice of {}: {} -> {:?}", transform, form, steps);
        Ok(steps)
    }

    /// Whether `(outer, inner)` lies on the lattice.
    pub fn contains(&self, outer: i64, inner: i64) -> bool {
        if outer % self.outer_step != 0 {
            return false;
        }
        let k = outer / self.outer_step;
        (inner - self.residue * k) % self.inner_step == 0
    }

    /// Index of the lattice in `Z^2`, equal to `|det T|`.
    pub fn index(&self) -> i64 {
        self.outer_step * self.inner_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unimodular_is_dense() {
        let t = TransformMatrix::from_rows(vec![vec![1, 1], vec![0, 1]]).unwrap();
        assert_eq!(LatticeSteps::of(&t).unwrap(), LatticeSteps::dense());
    }

    #[test]
    fn test_general_lattice() {
        let t = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        let steps = LatticeSteps::of(&t).unwrap();
        assert_eq!(steps.outer_step, 1);
        assert_eq!(steps.residue, 5);
        assert_eq!(steps.inner_step, 6);
        assert_eq!(steps.index(), 6);

        // Every image point lies on the lattice, and nothing else nearby does
        for x in -3..4 {
            for y in -3..4 {
                let p = t.apply(&[x, y]);
                assert!(steps.contains(p[0], p[1]));
                assert!(!steps.contains(p[0], p[1] + 1));
            }
        }
    }

    #[test]
    fn test_skew_lattice() {
        let t = TransformMatrix::from_rows(vec![vec![1, 0], vec![1, 2]]).unwrap();
        let steps = LatticeSteps::of(&t).unwrap();
        assert_eq!(steps, LatticeSteps { outer_step: 1, residue: 1, inner_step: 2 });
        assert!(steps.contains(3, 5));
        assert!(!steps.contains(3, 4));
    }

    #[test]
    fn test_wrong_dimension() {
        let t = TransformMatrix::identity(3);
        assert!(LatticeSteps::of(&t).is_err());
    }
}
