//! Loop transformations and closed-form bound derivation.
//!
//! `derive_bounds` turns an iteration domain and a non-singular integer
//! transform into a `LoopNestSpec` that visits the image of the domain in
//! lexicographic order. Two strategies cover everything supported:
//! - signed permutations in any dimension (`interchange`)
//! - every other 2-D transform, dense or lattice (`skewing`)

pub mod general;
pub mod interchange;
pub mod skewing;
pub mod tiling;

pub use general::GeneralTransform;
pub use interchange::{derive_permuted, Interchange};
pub use skewing::{derive_planar, Skewing};
pub use tiling::{Shear, TileConfig};

use crate::ir::LoopNestSpec;
use crate::polyhedral::{DependencePattern, IterationDomain, TransformClass, TransformMatrix};
use crate::utils::errors::{DerivationError, MatrixError, RemapResult};
use log::debug;

/// A transformation that can be expressed as an integer matrix.
pub trait Transform {
    /// Get transformation name.
    fn name(&self) -> &str;

    /// The matrix of this transformation on a `dim`-dimensional nest.
    fn matrix(&self, dim: usize) -> RemapResult<TransformMatrix>;

    /// Check if the transformed order respects every dependence.
    fn is_legal(&self, deps: &DependencePattern) -> bool {
        self.matrix(deps.dim())
            .map_or(false, |t| deps.is_respected_by(&t))
    }

    /// Derive the transformed loop nest over `domain`.
    fn derive(&self, domain: &IterationDomain) -> RemapResult<LoopNestSpec> {
        derive_bounds(domain, &self.matrix(domain.dim())?)
    }
}

/// Derive loop bounds, steps and the inverse mapping for `T` over `domain`.
pub fn derive_bounds(domain: &IterationDomain, transform: &TransformMatrix) -> RemapResult<LoopNestSpec> {
    if domain.dim() != transform.dim() {
        return Err(MatrixError::dimension_mismatch(domain.dim(), transform.dim()).into());
    }

    let class = transform.classify();
    match class {
        TransformClass::Identity | TransformClass::Permutation => {
            debug!("deriving {} over {} as a permutation", transform, domain);
            derive_permuted(domain, transform)
        }
        TransformClass::Unimodular | TransformClass::Lattice if transform.dim() == 2 => {
            debug!("deriving {} transform {} over {} by projection", class, transform, domain);
            derive_planar(domain, transform)
        }
        _ => Err(DerivationError::unsupported(format!(
            "no closed-form bounds for {} transform {} in {} dimensions",
            class,
            transform,
            transform.dim()
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::{DerivationErrorKind, MatrixErrorKind};

    #[test]
    fn test_dimension_mismatch() {
        let domain = IterationDomain::square(3, 4).unwrap();
        let err = derive_bounds(&domain, &TransformMatrix::identity(2)).unwrap_err();
        assert_eq!(err.matrix_kind(), Some(MatrixErrorKind::DimensionMismatch));
    }

    #[test]
    fn test_unsupported_three_dimensional_skew() {
        let domain = IterationDomain::square(3, 4).unwrap();
        let skew = TransformMatrix::skew(3, 0, 1, 1);
        let err = derive_bounds(&domain, &skew).unwrap_err();
        assert_eq!(err.derivation_kind(), Some(DerivationErrorKind::UnsupportedTransform));
    }

    #[test]
    fn test_three_dimensional_permutation() {
        let domain = IterationDomain::new(vec![0, 1, 2], vec![2, 3, 4]).unwrap();
        let t = TransformMatrix::interchange(3, 0, 2);
        let nest = derive_bounds(&domain, &t).unwrap();
        let mut visited = nest.iteration_points().unwrap();
        assert_eq!(visited.len(), domain.len());
        visited.sort();
        assert_eq!(visited, domain.points().collect::<Vec<_>>());
    }

    #[test]
    fn test_trait_legality() {
        let deps = DependencePattern::new(2, vec![vec![-1, 0], vec![0, -1]]).unwrap();
        assert!(Skewing::wavefront(0, 1).is_legal(&deps));
        let reversal = GeneralTransform::from_rows(vec![vec![-1, 0], vec![0, 1]]).unwrap();
        assert!(!reversal.is_legal(&deps));
    }
}
