//! Fixed-shape integer arrays.

use crate::polyhedral::IterationDomain;
use crate::utils::errors::DomainError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

/// A dense integer array indexed by the points of its shape.
///
/// Grids are never reshaped; `clone` is a deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    shape: IterationDomain,
    data: Vec<i64>,
}

/// One cell where two grids disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDiff {
    /// Index of the cell
    pub point: Vec<i64>,
    /// Value in the left grid
    pub left: i64,
    /// Value in the right grid
    pub right: i64,
}

impl Grid {
    /// A grid of zeros.
    pub fn zeros(shape: IterationDomain) -> Self {
        let data = vec![0; shape.len()];
        Self { shape, data }
    }

    /// A grid whose cells are drawn uniformly from `0..=max_value`.
    ///
    /// The same seed always produces the same grid. Panics if `max_value`
    /// is negative; `sweep` rejects such plans up front.
    pub fn random(shape: IterationDomain, seed: u64, max_value: i64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let data = (0..shape.len()).map(|_| rng.gen_range(0..=max_value)).collect();
        Self { shape, data }
    }

    /// A grid with `f(point)` in every cell.
    pub fn from_fn<F: FnMut(&[i64]) -> i64>(shape: IterationDomain, mut f: F) -> Self {
        let data = shape.points().map(|p| f(&p)).collect();
        Self { shape, data }
    }

    /// The index domain of the grid.
    pub fn shape(&self) -> &IterationDomain {
        &self.shape
    }

    /// Cell values in row-major order.
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    fn index(&self, point: &[i64]) -> Result<usize, DomainError> {
        self.shape
            .linear_index(point)
            .ok_or_else(|| DomainError::out_of_bounds(point, &self.shape))
    }

    /// Read a cell.
    pub fn get(&self, point: &[i64]) -> Result<i64, DomainError> {
        Ok(self.data[self.index(point)?])
    }

    /// Write a cell.
    pub fn set(&mut self, point: &[i64], value: i64) -> Result<(), DomainError> {
        let index = self.index(point)?;
        self.data[index] = value;
        Ok(())
    }

    /// Cells where `self` and `other` differ, or `None` if the shapes differ.
    pub fn diff(&self, other: &Grid) -> Option<Vec<CellDiff>> {
        if self.shape != other.shape {
            return None;
        }
        Some(
            self.shape
                .points()
                .zip(self.data.iter().zip(&other.data))
                .filter(|(_, (l, r))| l != r)
                .map(|(point, (&left, &right))| CellDiff { point, left, right })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::DomainErrorKind;

    fn shape() -> IterationDomain {
        IterationDomain::square(2, 4).unwrap()
    }

    #[test]
    fn test_get_set() {
        let mut g = Grid::zeros(shape());
        g.set(&[1, 2], 7).unwrap();
        assert_eq!(g.get(&[1, 2]).unwrap(), 7);
        assert_eq!(g.data()[6], 7);
        let err = g.get(&[4, 0]).unwrap_err();
        assert_eq!(err.kind, DomainErrorKind::OutOfBounds);
        assert!(g.set(&[-1, 0], 1).is_err());
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = Grid::random(shape(), 42, 10);
        let b = Grid::random(shape(), 42, 10);
        assert_eq!(a, b);
        assert!(a.data().iter().all(|&v| (0..=10).contains(&v)));
        assert_ne!(a, Grid::random(shape(), 43, 10));
    }

    #[test]
    fn test_clone_is_independent() {
        let a = Grid::from_fn(shape(), |p| p[0] * 10 + p[1]);
        let mut b = a.clone();
        b.set(&[0, 0], -1).unwrap();
        assert_eq!(a.get(&[0, 0]).unwrap(), 0);
        assert_eq!(a.diff(&b).unwrap().len(), 1);
    }

    #[test]
    fn test_diff() {
        let a = Grid::zeros(shape());
        let mut b = a.clone();
        b.set(&[3, 1], 5).unwrap();
        let diffs = a.diff(&b).unwrap();
        assert_eq!(diffs, vec![CellDiff { point: vec![3, 1], left: 0, right: 5 }]);
        let other = Grid::zeros(IterationDomain::square(2, 5).unwrap());
        assert!(a.diff(&other).is_none());
    }
}
