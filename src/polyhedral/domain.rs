//! Rectangular iteration domains.
//!
//! A domain is the half-open box `[l0, u0) x [l1, u1) x ...` a loop nest
//! visits. The same type describes the shape of a `Grid`.

use crate::utils::errors::DomainError;
use serde::{Serialize, Deserialize};
use std::fmt;

/// An axis-aligned integer box with half-open bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IterationDomain {
    lower: Vec<i64>,
    upper: Vec<i64>,
}

impl IterationDomain {
    /// Create a domain from per-axis lower (inclusive) and upper (exclusive) bounds.
    pub fn new(lower: Vec<i64>, upper: Vec<i64>) -> Result<Self, DomainError> {
        if lower.len() != upper.len() {
            return Err(DomainError::dimension_mismatch(lower.len(), upper.len()));
        }
        for (axis, (&l, &u)) in lower.iter().zip(&upper).enumerate() {
            if l >= u {
                return Err(DomainError::empty_axis(axis, l, u));
            }
        }
        Ok(Self { lower, upper })
    }

    /// The 2-D domain `[a1, b1) x [a2, b2)`.
    pub fn rect(a1: i64, b1: i64, a2: i64, b2: i64) -> Result<Self, DomainError> {
        Self::new(vec![a1, a2], vec![b1, b2])
    }

    /// The cube `[0, n)^dims`.
    pub fn square(dims: usize, n: i64) -> Result<Self, DomainError> {
        Self::new(vec![0; dims], vec![n; dims])
    }

    /// Number of axes.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Inclusive lower bounds.
    pub fn lower(&self) -> &[i64] {
        &self.lower
    }

    /// Exclusive upper bounds.
    pub fn upper(&self) -> &[i64] {
        &self.upper
    }

    /// Number of points along one axis.
    pub fn extent(&self, axis: usize) -> i64 {
        self.upper[axis] - self.lower[axis]
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        (0..self.dim()).map(|a| self.extent(a) as usize).product()
    }

    /// Domains are never empty; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if a point lies inside the domain.
    pub fn contains(&self, point: &[i64]) -> bool {
        point.len() == self.dim()
            && point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&p, (&l, &u))| l <= p && p < u)
    }

    /// Check if another domain lies entirely inside this one.
    pub fn contains_domain(&self, other: &IterationDomain) -> bool {
        other.dim() == self.dim()
            && (0..self.dim())
                .all(|a| self.lower[a] <= other.lower[a] && other.upper[a] <= self.upper[a])
    }

    /// The domain moved by `offset`.
    pub fn translate(&self, offset: &[i64]) -> Result<Self, DomainError> {
        if offset.len() != self.dim() {
            return Err(DomainError::dimension_mismatch(self.dim(), offset.len()));
        }
        Ok(Self {
            lower: self.lower.iter().zip(offset).map(|(l, o)| l + o).collect(),
            upper: self.upper.iter().zip(offset).map(|(u, o)| u + o).collect(),
        })
    }

    /// Row-major position of a point, if it is inside.
    pub fn linear_index(&self, point: &[i64]) -> Option<usize> {
        if !self.contains(point) {
            return None;
        }
        let mut index = 0usize;
        for axis in 0..self.dim() {
            index = index * self.extent(axis) as usize + (point[axis] - self.lower[axis]) as usize;
        }
        Some(index)
    }

    /// All `2^n` corners, using inclusive upper coordinates.
    pub fn corners(&self) -> Vec<Vec<i64>> {
        let n = self.dim();
        (0..(1usize << n))
            .map(|mask| {
                (0..n)
                    .map(|a| {
                        if mask & (1 << a) == 0 {
                            self.lower[a]
                        } else {
                            self.upper[a] - 1
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Iterate over all points in lexicographic order.
    pub fn points(&self) -> Points<'_> {
        Points {
            domain: self,
            next: Some(self.lower.clone()),
        }
    }
}

/// Lexicographic point iterator over an `IterationDomain`.
#[derive(Debug, Clone)]
pub struct Points<'a> {
    domain: &'a IterationDomain,
    next: Option<Vec<i64>>,
}

impl Iterator for Points<'_> {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Vec<i64>> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        for axis in (0..succ.len()).rev() {
            succ[axis] += 1;
            if succ[axis] < self.domain.upper[axis] {
                self.next = Some(succ);
                return Some(current);
            }
            succ[axis] = self.domain.lower[axis];
        }
        Some(current)
    }
}

impl fmt::Display for IterationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (axis, (l, u)) in self.lower.iter().zip(&self.upper).enumerate() {
            if axis > 0 {
                write!(f, " x ")?;
            }
            write!(f, "[{}, {})", l, u)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::DomainErrorKind;

    #[test]
    fn test_rect() {
        let d = IterationDomain::rect(4, 15, 6, 19).unwrap();
        assert_eq!(d.dim(), 2);
        assert_eq!(d.len(), 11 * 13);
        assert!(d.contains(&[4, 6]));
        assert!(d.contains(&[14, 18]));
        assert!(!d.contains(&[15, 6]));
        assert!(!d.contains(&[4]));
    }

    #[test]
    fn test_empty_axis_rejected() {
        let err = IterationDomain::rect(3, 3, 0, 1).unwrap_err();
        assert_eq!(err.kind, DomainErrorKind::EmptyAxis);
    }

    #[test]
    fn test_points_lexicographic() {
        let d = IterationDomain::rect(0, 2, 5, 7).unwrap();
        let points: Vec<_> = d.points().collect();
        assert_eq!(points, vec![vec![0, 5], vec![0, 6], vec![1, 5], vec![1, 6]]);
    }

    #[test]
    fn test_linear_index() {
        let d = IterationDomain::rect(1, 4, 2, 5).unwrap();
        for (k, p) in d.points().enumerate() {
            assert_eq!(d.linear_index(&p), Some(k));
        }
        assert_eq!(d.linear_index(&[0, 2]), None);
    }

    #[test]
    fn test_corners() {
        let d = IterationDomain::rect(0, 10, 5, 8).unwrap();
        let mut corners = d.corners();
        corners.sort();
        assert_eq!(corners, vec![vec![0, 5], vec![0, 7], vec![9, 5], vec![9, 7]]);
    }

    #[test]
    fn test_translate_and_containment() {
        let outer = IterationDomain::square(2, 10).unwrap();
        let inner = IterationDomain::rect(1, 10, 1, 10).unwrap();
        assert!(outer.contains_domain(&inner.translate(&[-1, 0]).unwrap()));
        assert!(!outer.contains_domain(&inner.translate(&[1, 0]).unwrap()));
    }

    #[test]
    fn test_display() {
        let d = IterationDomain::rect(1, 100, 1, 100).unwrap();
        assert_eq!(d.to_string(), "[1, 100) x [1, 100)");
    }
}
