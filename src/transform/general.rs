//! Arbitrary non-singular integer transforms.

use crate::polyhedral::TransformMatrix;
use crate::transform::Transform;
use crate::utils::errors::{MatrixError, RemapResult};

/// A transform given directly by its matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralTransform {
    matrix: TransformMatrix,
}

impl GeneralTransform {
    /// Wrap a transform matrix.
    pub fn new(matrix: TransformMatrix) -> Self {
        Self { matrix }
    }

    /// Build from rows, rejecting singular or non-square input.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> RemapResult<Self> {
        Ok(Self::new(TransformMatrix::from_rows(rows)?))
    }
}

impl Transform for GeneralTransform {
    fn name(&self) -> &str {
        "general"
    }

    fn matrix(&self, dim: usize) -> RemapResult<TransformMatrix> {
        if dim != self.matrix.dim() {
            return Err(MatrixError::dimension_mismatch(self.matrix.dim(), dim).into());
        }
        Ok(self.matrix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::IterationDomain;

    #[test]
    fn test_general_derivation() {
        let t = GeneralTransform::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        let domain = IterationDomain::rect(4, 15, 6, 19).unwrap();
        let nest = t.derive(&domain).unwrap();
        assert_eq!(nest.index_formulas(), vec!["(4*c0 - 2*c1) / 6", "(-3*c0 + 3*c1) / 6"]);
        assert_eq!(nest.iteration_points().unwrap().len(), domain.len());
    }

    #[test]
    fn test_wrong_dimension() {
        let t = GeneralTransform::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        assert!(t.matrix(3).is_err());
        assert!(GeneralTransform::from_rows(vec![vec![2, 4], vec![1, 2]]).is_err());
    }
}
