//! Integer transformation matrices and their exact inverses.
//!
//! A transform maps an original iteration `p` to `T * p`. The transformed
//! loop nest enumerates image points in lexicographic order, and the inverse
//! recovers `p = adj(T) * q / det(T)`.

use crate::utils::errors::{DerivationError, MatrixError};
use crate::utils::matrix::IntMatrix;
use crate::utils::pretty::format_linear;
use serde::{Serialize, Deserialize};
use std::fmt;

/// Shape of a transform, which decides how bounds are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformClass {
    /// `T = I`
    Identity,
    /// One ±1 per row and column: loop interchange and reversal
    Permutation,
    /// `|det T| = 1`: skews and shears
    Unimodular,
    /// `|det T| > 1`: the image is a sparse lattice
    Lattice,
}

impl fmt::Display for TransformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransformClass::Identity => "identity",
            TransformClass::Permutation => "permutation",
            TransformClass::Unimodular => "unimodular",
            TransformClass::Lattice => "lattice",
        };
        write!(f, "{}", s)
    }
}

/// A square, non-singular integer matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformMatrix {
    matrix: IntMatrix,
    det: i64,
}

impl TransformMatrix {
    /// Wrap a matrix, checking that it is square and non-singular.
    pub fn new(matrix: IntMatrix) -> Result<Self, MatrixError> {
        if !matrix.is_square() {
            return Err(MatrixError::non_square(matrix.nrows(), matrix.ncols()));
        }
        let det = matrix
            .determinant()
            .ok_or_else(|| MatrixError::non_square(matrix.nrows(), matrix.ncols()))?;
        if det == 0 {
            return Err(MatrixError::singular());
        }
        Ok(Self { matrix, det })
    }

    /// Build from rows.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, MatrixError> {
        Self::new(IntMatrix::from_rows(rows)?)
    }

    /// The identity transform.
    pub fn identity(n: usize) -> Self {
        Self {
            matrix: IntMatrix::identity(n),
            det: 1,
        }
    }

    /// Swap axes `a` and `b`.
    pub fn interchange(n: usize, a: usize, b: usize) -> Self {
        let mut matrix = IntMatrix::identity(n);
        matrix.swap_cols(a, b);
        let det = if a == b { 1 } else { -1 };
        Self { matrix, det }
    }

    /// `target' = target + factor * source`, all other axes unchanged.
    pub fn skew(n: usize, target: usize, source: usize, factor: i64) -> Self {
        let mut matrix = IntMatrix::identity(n);
        if target != source {
            matrix.set(target, source, factor);
        }
        Self { matrix, det: 1 }
    }

    /// Number of axes.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &IntMatrix {
        &self.matrix
    }

    /// `det(T)`, never zero.
    pub fn determinant(&self) -> i64 {
        self.det
    }

    /// `|det T| = 1`.
    pub fn is_unimodular(&self) -> bool {
        self.det.abs() == 1
    }

    /// Classify the transform.
    pub fn classify(&self) -> TransformClass {
        if self.matrix == IntMatrix::identity(self.dim()) {
            TransformClass::Identity
        } else if self.matrix.is_signed_permutation() {
            TransformClass::Permutation
        } else if self.is_unimodular() {
            TransformClass::Unimodular
        } else {
            TransformClass::Lattice
        }
    }

    /// Image of a point.
    pub fn apply(&self, point: &[i64]) -> Vec<i64> {
        self.matrix.mul_vec(point).unwrap_or_default()
    }

    /// The exact inverse mapping.
    pub fn inverse(&self) -> InverseMap {
        InverseMap {
            adjugate: self.matrix.adjugate().unwrap_or_else(|| IntMatrix::identity(self.dim())),
            det: self.det,
        }
    }
}

impl fmt::Display for TransformMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.matrix)
    }
}

/// `p = adjugate * q / det`, exact on the image lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseMap {
    adjugate: IntMatrix,
    det: i64,
}

impl InverseMap {
    /// The identity mapping on `n` axes.
    pub fn identity(n: usize) -> Self {
        Self {
            adjugate: IntMatrix::identity(n),
            det: 1,
        }
    }

    /// Number of axes.
    pub fn dim(&self) -> usize {
        self.adjugate.nrows()
    }

    /// The adjugate matrix.
    pub fn adjugate(&self) -> &IntMatrix {
        &self.adjugate
    }

    /// The common divisor `det(T)`.
    pub fn divisor(&self) -> i64 {
        self.det
    }

    /// Map a transformed point back to original indices.
    ///
    /// A nonzero remainder means the point is not on the image lattice,
    /// which only happens when the derived bounds are wrong.
    pub fn apply(&self, point: &[i64]) -> Result<Vec<i64>, DerivationError> {
        let scaled = self.adjugate.mul_vec(point).ok_or_else(|| {
            DerivationError::mismatch(format!(
                "inverse expects {} coordinates, got {}",
                self.dim(),
                point.len()
            ))
        })?;
        scaled
            .into_iter()
            .map(|v| {
                if v % self.det != 0 {
                    Err(DerivationError::mismatch(format!(
                        "{:?} is not on the image lattice ({} not divisible by {})",
                        point, v, self.det
                    )))
                } else {
                    Ok(v / self.det)
                }
            })
            .collect()
    }

    /// Render each original index as an expression over `names`.
    pub fn formulas(&self, names: &[String]) -> Vec<String> {
        self.adjugate
            .rows()
            .iter()
            .map(|row| {
                let sign = self.det.signum();
                let signed: Vec<i64> = row.iter().map(|c| c * sign).collect();
                let numerator = format_linear(&signed, names, 0);
                if self.det.abs() == 1 {
                    numerator
                } else {
                    format!("({}) / {}", numerator, self.det.abs())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::{DerivationErrorKind, MatrixErrorKind};

    #[test]
    fn test_rejects_singular() {
        let err = TransformMatrix::from_rows(vec![vec![1, 2], vec![2, 4]]).unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::SingularTransform);
    }

    #[test]
    fn test_rejects_non_square() {
        let err = TransformMatrix::from_rows(vec![vec![1, 2, 3]]).unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::NonSquareMatrix);
    }

    #[test]
    fn test_classify() {
        assert_eq!(TransformMatrix::identity(2).classify(), TransformClass::Identity);
        assert_eq!(TransformMatrix::interchange(2, 0, 1).classify(), TransformClass::Permutation);
        assert_eq!(TransformMatrix::skew(2, 0, 1, 1).classify(), TransformClass::Unimodular);
        let general = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        assert_eq!(general.classify(), TransformClass::Lattice);
        assert_eq!(general.determinant(), 6);
    }

    #[test]
    fn test_skew_matrix() {
        // i' = i + j, j' = j
        let t = TransformMatrix::skew(2, 0, 1, 1);
        assert_eq!(t.apply(&[3, 4]), vec![7, 4]);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        let inv = t.inverse();
        assert_eq!(inv.apply(&t.apply(&[4, 6])).unwrap(), vec![4, 6]);
        assert_eq!(inv.apply(&t.apply(&[-2, 9])).unwrap(), vec![-2, 9]);
    }

    #[test]
    fn test_inverse_detects_off_lattice() {
        let t = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        let err = t.inverse().apply(&[24, 37]).unwrap_err();
        assert_eq!(err.kind, DerivationErrorKind::BoundsDerivationMismatch);
    }

    #[test]
    fn test_formulas() {
        let names = vec!["c0".to_string(), "c1".to_string()];
        let wavefront = TransformMatrix::skew(2, 0, 1, 1);
        assert_eq!(wavefront.inverse().formulas(&names), vec!["c0 - c1", "c1"]);
        let general = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        assert_eq!(
            general.inverse().formulas(&names),
            vec!["(4*c0 - 2*c1) / 6", "(-3*c0 + 3*c1) / 6"]
        );
        let swap = TransformMatrix::interchange(2, 0, 1);
        assert_eq!(swap.inverse().formulas(&names), vec!["c1", "c0"]);
    }
}
