//! Static checks of a derived loop nest.
//!
//! Both checks enumerate the nest once. Coverage requires that mapping every
//! visited point back through the inverse lands in the original domain and
//! hits each of its points exactly once. Dependence order requires that for
//! every in-domain source `p + d` of an iteration `p`, the source is visited
//! first.

use crate::ir::LoopNestSpec;
use crate::polyhedral::DependencePattern;
use crate::utils::errors::{DerivationError, RemapResult};
use std::collections::HashMap;

/// Position of every visited original point in visiting order.
fn visit_positions(nest: &LoopNestSpec) -> RemapResult<HashMap<Vec<i64>, usize>> {
    let domain = &nest.domain;
    let mut positions = HashMap::with_capacity(domain.len());
    let mut step = 0usize;
    nest.visit(|p: &[i64]| {
        if !domain.contains(p) {
            return Err(DerivationError::mismatch(format!("visits {:?}, outside {}", p, domain)).into());
        }
        if positions.insert(p.to_vec(), step).is_some() {
            return Err(DerivationError::mismatch(format!("visits {:?} twice", p)).into());
        }
        step += 1;
        Ok(())
    })?;
    if positions.len() != domain.len() {
        return Err(DerivationError::mismatch(format!(
            "visits {} of the {} points of {}",
            positions.len(),
            domain.len(),
            domain
        ))
        .into());
    }
    Ok(positions)
}

/// Check that the nest visits its domain exactly once per point.
pub fn verify_coverage(nest: &LoopNestSpec) -> RemapResult<()> {
    visit_positions(nest).map(|_| ())
}

/// Check coverage, then that every dependence source precedes its consumer.
pub fn verify_dependence_order(nest: &LoopNestSpec, deps: &DependencePattern) -> RemapResult<()> {
    let positions = visit_positions(nest)?;
    for (point, &at) in &positions {
        for offset in deps.offsets() {
            let source: Vec<i64> = point.iter().zip(offset).map(|(p, d)| p + d).collect();
            if let Some(&before) = positions.get(&source) {
                if before >= at {
                    return Err(DerivationError::dependence_order(&source, point).into());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Bound, LoopSpec};
    use crate::polyhedral::{IterationDomain, TransformMatrix};
    use crate::transform::derive_bounds;
    use crate::utils::errors::DerivationErrorKind;

    fn stencil() -> DependencePattern {
        DependencePattern::new(2, vec![vec![-1, 0], vec![0, -1]]).unwrap()
    }

    #[test]
    fn test_reference_covers() {
        let domain = IterationDomain::rect(1, 10, 1, 10).unwrap();
        let nest = LoopNestSpec::reference(&domain);
        verify_coverage(&nest).unwrap();
        verify_dependence_order(&nest, &stencil()).unwrap();
    }

    #[test]
    fn test_truncated_nest_detected() {
        let domain = IterationDomain::rect(0, 4, 0, 4).unwrap();
        let mut nest = LoopNestSpec::reference(&domain);
        nest.loops[1] = LoopSpec::new("c1", Bound::Const(0), Bound::Const(2), 1);
        let err = verify_coverage(&nest).unwrap_err();
        assert_eq!(err.derivation_kind(), Some(DerivationErrorKind::BoundsDerivationMismatch));
    }

    #[test]
    fn test_overshooting_nest_detected() {
        let domain = IterationDomain::rect(0, 4, 0, 4).unwrap();
        let mut nest = LoopNestSpec::reference(&domain);
        nest.loops[0] = LoopSpec::new("c0", Bound::Const(0), Bound::Const(4), 1);
        assert!(verify_coverage(&nest).is_err());
    }

    #[test]
    fn test_reversal_breaks_order() {
        let domain = IterationDomain::rect(0, 4, 0, 4).unwrap();
        let t = TransformMatrix::from_rows(vec![vec![-1, 0], vec![0, 1]]).unwrap();
        let nest = derive_bounds(&domain, &t).unwrap();
        verify_coverage(&nest).unwrap();
        let err = verify_dependence_order(&nest, &stencil()).unwrap_err();
        assert_eq!(err.derivation_kind(), Some(DerivationErrorKind::DependenceOrderViolation));
    }
}
