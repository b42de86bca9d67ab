//! Loop skewing and bound derivation for general 2-D transforms.
//!
//! Skewing transforms a loop nest to expose parallelism in loops with
//! dependences. It's essential for wavefront parallelization.
//!
//! Example:
//! ```text
//! for i = 1 to N:
//!   for j = 1 to N:
//!     A[i][j] = A[i-1][j] + A[i][j-1]
//! ```
//! After skewing i by j (i' = i + j):
//! ```text
//! for i' = 2 to 2N - 2:
//!   for j = max(1, i' - N + 1) to min(N - 1, i' - 1):
//!     A[i'-j][j] = A[i'-j-1][j] + A[i'-j][j-1]
//! ```
//! Now iterations with the same i' value are independent and can run in parallel.
//!
//! The same projection handles every non-singular 2-D matrix. For
//! `T = [[p, r], [q, s]]` with `δ = det T`, the original indices of an image
//! point `(i, j)` are `x = (s*i - r*j) / δ` and `y = (p*j - q*i) / δ`, so each
//! original axis bound becomes a bound on `c * j` that is affine in `i`.

use crate::ir::{transformed_var, AffineBound, Bound, LoopNestSpec, LoopSpec};
use crate::lattice::LatticeSteps;
use crate::polyhedral::{IterationDomain, TransformMatrix};
use crate::transform::Transform;
use crate::utils::errors::{MatrixError, RemapResult};
use crate::utils::matrix::{ceil_div, floor_div};
use log::debug;

/// Loop skewing transformation.
#[derive(Debug, Clone)]
pub struct Skewing {
    /// Target dimension to skew
    pub target_dim: usize,
    /// Source dimension to skew by
    pub source_dim: usize,
    /// Skewing factor (target' = target + factor * source)
    pub factor: i64,
}

impl Skewing {
    /// Create a new skewing transformation.
    pub fn new(target_dim: usize, source_dim: usize, factor: i64) -> Self {
        Self {
            target_dim,
            source_dim,
            factor,
        }
    }

    /// Create skewing for wavefront parallelization.
    /// Skews outer loop by inner loop: i' = i + j
    pub fn wavefront(outer: usize, inner: usize) -> Self {
        Self::new(outer, inner, 1)
    }
}

impl Transform for Skewing {
    fn name(&self) -> &str {
        "skewing"
    }

    fn matrix(&self, dim: usize) -> RemapResult<TransformMatrix> {
        if self.target_dim >= dim || self.source_dim >= dim {
            return Err(MatrixError::dimension_mismatch(self.target_dim.max(self.source_dim) + 1, dim).into());
        }
        Ok(TransformMatrix::skew(dim, self.target_dim, self.source_dim, self.factor))
    }
}

/// `c * j` lies in `[lo.0 * i + lo.1, hi.0 * i + hi.1]`.
struct InnerConstraint {
    c: i64,
    lo: (i64, i64),
    hi: (i64, i64),
}

impl InnerConstraint {
    /// Bounds on `j` itself, or `None` when `j` does not appear.
    fn bounds(&self) -> Option<(Bound, Bound)> {
        let (c, lo, hi) = match self.c {
            0 => return None,
            c if c > 0 => (c, self.lo, self.hi),
            c => (-c, (-self.hi.0, -self.hi.1), (-self.lo.0, -self.lo.1)),
        };
        Some((affine(lo, c, true), affine(hi, c, false)))
    }
}

/// `ceil` or `floor` of `(k * i + k0) / c`, folded when it is constant.
fn affine((k, k0): (i64, i64), c: i64, ceil: bool) -> Bound {
    match (k, c) {
        (0, _) if ceil => Bound::Const(ceil_div(k0, c)),
        (0, _) => Bound::Const(floor_div(k0, c)),
        (_, 1) => Bound::Affine(AffineBound::linear(vec![k], k0)),
        _ if ceil => Bound::Affine(AffineBound::ceil(vec![k], k0, c)),
        _ => Bound::Affine(AffineBound::floor(vec![k], k0, c)),
    }
}

/// Bounds for any non-singular 2-D transform.
///
/// The outer loop spans the projection of the domain's corners on the first
/// row of `T`. The inner loop intersects the two original-axis constraints;
/// when `|det T| > 1` it starts on the image lattice and steps over it.
pub fn derive_planar(domain: &IterationDomain, transform: &TransformMatrix) -> RemapResult<LoopNestSpec> {
    if transform.dim() != 2 || domain.dim() != 2 {
        return Err(MatrixError::dimension_mismatch(2, transform.dim()).into());
    }
    let m = transform.matrix();
    let (p, r, q, s) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
    let det = transform.determinant();
    let (sg, dm) = (det.signum(), det.abs());
    let (a1, b1) = (domain.lower()[0], domain.upper()[0] - 1);
    let (a2, b2) = (domain.lower()[1], domain.upper()[1] - 1);

    let steps = LatticeSteps::of(transform)?;

    let projections: Vec<i64> = domain.corners().iter().map(|c| p * c[0] + r * c[1]).collect();
    let lo = projections.iter().copied().min().unwrap_or(0);
    let hi = projections.iter().copied().max().unwrap_or(0);
    let outer_lo = ceil_div(lo, steps.outer_step) * steps.outer_step;
    let outer_hi = floor_div(hi, steps.outer_step) * steps.outer_step;

    let constraints = [
        // a2 <= y <= b2, with δ*y = p*j - q*i
        InnerConstraint {
            c: sg * p,
            lo: (sg * q, a2 * dm),
            hi: (sg * q, b2 * dm),
        },
        // a1 <= x <= b1, with δ*x = s*i - r*j
        InnerConstraint {
            c: sg * r,
            lo: (sg * s, -b1 * dm),
            hi: (sg * s, -a1 * dm),
        },
    ];
    let (lowers, uppers): (Vec<Bound>, Vec<Bound>) = constraints.iter().filter_map(InnerConstraint::bounds).unzip();

    let mut inner_lower = Bound::max_of(lowers);
    if steps.inner_step > 1 {
        inner_lower = Bound::Aligned {
            base: Box::new(inner_lower),
            residue: AffineBound::floor(vec![steps.residue], 0, steps.outer_step),
            modulus: steps.inner_step,
        };
    }
    let inner_upper = Bound::min_of(uppers);

    debug!(
        "outer {}..={} step {}, lattice {:?}",
        outer_lo, outer_hi, steps.outer_step, steps
    );

    let loops = vec![
        LoopSpec::new(transformed_var(0), Bound::Const(outer_lo), Bound::Const(outer_hi), steps.outer_step),
        LoopSpec::new(transformed_var(1), inner_lower, inner_upper, steps.inner_step),
    ];

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

    fn sorted(mut v: Vec<Vec<i64>>) -> Vec<Vec<i64>> {
        v.sort();
        v
    }

    fn assert_covers(domain: &IterationDomain, t: &TransformMatrix) {
        let nest = derive_planar(domain, t).unwrap();
        let visited = nest.iteration_points().unwrap();
        assert_eq!(visited.len(), domain.len(), "{} over {}", t, domain);
        assert_eq!(sorted(visited), domain.points().collect::<Vec<_>>());
    }

    #[test]
    fn test_wavefront_bounds() {
        let domain = IterationDomain::rect(1, 100, 1, 100).unwrap();
        let nest = Skewing::wavefront(0, 1).derive(&domain).unwrap();
        assert_eq!(nest.loops[0].lower, Bound::Const(2));
        assert_eq!(nest.loops[0].upper, Bound::Const(198));
        let names = nest.var_names();
        assert_eq!(nest.loops[1].lower.render(&names[..1]), "max(1, c0 - 99)");
        assert_eq!(nest.loops[1].upper.render(&names[..1]), "min(99, c0 - 1)");
        assert_eq!(nest.loops[1].lower.eval(&[2]), 1);
        assert_eq!(nest.loops[1].upper.eval(&[2]), 1);
    }

    #[test]
    fn test_wavefront_order() {
        let domain = IterationDomain::rect(0, 2, 0, 2).unwrap();
        let nest = Skewing::wavefront(0, 1).derive(&domain).unwrap();
        assert_eq!(
            nest.iteration_points().unwrap(),
            vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]
        );
    }

    #[test]
    fn test_sheared_bounds() {
        let domain = IterationDomain::rect(4, 15, 6, 19).unwrap();
        let t = TransformMatrix::from_rows(vec![vec![1, 2], vec![0, 1]]).unwrap();
        let nest = derive_planar(&domain, &t).unwrap();
        let names = nest.var_names();
        assert_eq!(nest.loops[1].lower.render(&names[..1]), "max(6, ceild(c0 - 14, 2))");
        assert_eq!(nest.loops[1].upper.render(&names[..1]), "min(18, floord(c0 - 4, 2))");
        assert_covers(&domain, &t);
    }

    #[test]
    fn test_lattice_steps_in_nest() {
        let domain = IterationDomain::rect(4, 15, 6, 19).unwrap();
        let t = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        let nest = derive_planar(&domain, &t).unwrap();
        assert_eq!(nest.loops[0].step, 1);
        assert_eq!(nest.loops[1].step, 6);
        assert!(matches!(nest.loops[1].lower, Bound::Aligned { modulus: 6, .. }));
        assert_covers(&domain, &t);
    }

    #[test]
    fn test_coverage_of_catalog_shapes() {
        let domain = IterationDomain::rect(4, 15, 6, 19).unwrap();
        for rows in [
            vec![vec![1, 1], vec![0, 1]],
            vec![vec![1, 0], vec![1, 2]],
            vec![vec![1, 1], vec![0, 2]],
            vec![vec![2, 1], vec![1, 1]],
            vec![vec![0, 1], vec![1, 1]],
            vec![vec![1, -1], vec![2, 3]],
        ] {
            assert_covers(&domain, &TransformMatrix::from_rows(rows).unwrap());
        }
    }

    #[test]
    fn test_visit_order_is_lexicographic_in_image() {
        let domain = IterationDomain::rect(0, 5, 0, 7).unwrap();
        let t = TransformMatrix::from_rows(vec![vec![3, 2], vec![3, 4]]).unwrap();
        let nest = derive_planar(&domain, &t).unwrap();
        let image = nest.transformed_points().unwrap();
        assert!(image.windows(2).all(|w| w[0] < w[1]));
    }
}
