//! Loop interchange and other signed permutations.
//!
//! Interchange swaps two loops in a loop nest. A signed permutation matrix
//! maps every original axis onto exactly one new axis, possibly reversed, so
//! the bounds of each new loop are the constant image of one original axis.
//!
//! Example:
//! ```text
//! for i = 0 to N:
//!   for j = 2 to N:
//!     A[i][j] = A[i][j-1] + A[i][j-2]
//! ```
//! becomes (after interchange(0, 1)):
//! ```text
//! for j = 2 to N:
//!   for i = 0 to N:
//!     A[i][j] = A[i][j-1] + A[i][j-2]
//! ```

use crate::ir::{transformed_var, Bound, LoopNestSpec, LoopSpec};
use crate::polyhedral::{IterationDomain, TransformMatrix};
use crate::transform::Transform;
use crate::utils::errors::{DerivationError, MatrixError, RemapResult};

/// Loop interchange transformation.
#[derive(Debug, Clone)]
pub struct Interchange {
    /// First dimension to swap
    pub dim1: usize,
    /// Second dimension to swap
    pub dim2: usize,
}

impl Interchange {
    /// Create a new interchange transformation.
    pub fn new(dim1: usize, dim2: usize) -> Self {
        Self { dim1, dim2 }
    }
}

impl Transform for Interchange {
    fn name(&self) -> &str {
        "interchange"
    }

    fn matrix(&self, dim: usize) -> RemapResult<TransformMatrix> {
        if self.dim1 >= dim || self.dim2 >= dim {
            return Err(MatrixError::dimension_mismatch(self.dim1.max(self.dim2) + 1, dim).into());
        }
        Ok(TransformMatrix::interchange(dim, self.dim1, self.dim2))
    }
}

/// Bounds for a signed permutation: new axis `r` takes the range of the
/// original axis `c` with `T[r][c] = ±1`, negated and flipped for `-1`.
pub fn derive_permuted(domain: &IterationDomain, transform: &TransformMatrix) -> RemapResult<LoopNestSpec> {
    let matrix = transform.matrix();
    let mut loops = Vec::with_capacity(transform.dim());

    for r in 0..transform.dim() {
        let Some(c) = (0..transform.dim()).find(|&c| matrix[(r, c)] != 0) else {
            return Err(DerivationError::unsupported(format!("row {} of {} is zero", r, transform)).into());
        };
        let (a, b) = (domain.lower()[c], domain.upper()[c] - 1);
        let (lower, upper) = match matrix[(r, c)] {
            1 => (a, b),
            -1 => (-b, -a),
            other => {
                return Err(DerivationError::unsupported(format!(
                    "entry {} of {} is not a signed unit",
                    other, transform
                ))
                .into())
            }
        };
        loops.push(LoopSpec::new(transformed_var(r), Bound::Const(lower), Bound::Const(upper), 1));
    }

    Ok(LoopNestSpec {
        domain: domain.clone(),
        transform: transform.clone(),
        loops,
        inverse: transform.inverse(),
        body: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::derive_bounds;

    #[test]
    fn test_interchange_bounds() {
        let domain = IterationDomain::rect(0, 100, 2, 100).unwrap();
        let nest = Interchange::new(0, 1).derive(&domain).unwrap();
        assert_eq!(nest.loops[0].lower, Bound::Const(2));
        assert_eq!(nest.loops[0].upper, Bound::Const(99));
        assert_eq!(nest.loops[1].lower, Bound::Const(0));
        assert_eq!(nest.loops[1].upper, Bound::Const(99));
        assert_eq!(nest.index_formulas(), vec!["c1", "c0"]);
    }

    #[test]
    fn test_interchange_order() {
        let domain = IterationDomain::rect(0, 2, 0, 3).unwrap();
        let nest = Interchange::new(0, 1).derive(&domain).unwrap();
        let points = nest.iteration_points().unwrap();
        assert_eq!(
            points,
            vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1], vec![0, 2], vec![1, 2]]
        );
    }

    #[test]
    fn test_reversal() {
        let domain = IterationDomain::rect(3, 6, 0, 2).unwrap();
        let t = TransformMatrix::from_rows(vec![vec![-1, 0], vec![0, 1]]).unwrap();
        let nest = derive_bounds(&domain, &t).unwrap();
        assert_eq!(nest.loops[0].lower, Bound::Const(-5));
        assert_eq!(nest.loops[0].upper, Bound::Const(-3));
        let first: Vec<_> = nest.iteration_points().unwrap().into_iter().take(2).collect();
        assert_eq!(first, vec![vec![5, 0], vec![5, 1]]);
    }

    #[test]
    fn test_out_of_range_axis() {
        assert!(Interchange::new(0, 2).matrix(2).is_err());
    }
}
