//! Integer matrices for affine transformations.
//!
//! Entries are `i64`; determinants and inverses go through `Rational64` so
//! every intermediate stays exact.

use crate::utils::errors::MatrixError;
use num_integer::Integer;
use num_rational::Rational64;
use num_traits::{Signed, Zero};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::ops::Index;

/// A dense integer matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntMatrix {
    data: Vec<Vec<i64>>,
    rows: usize,
    cols: usize,
}

impl IntMatrix {
    /// Create a new matrix with the given dimensions, initialized to zero.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![vec![0; cols]; rows],
            rows,
            cols,
        }
    }

    /// Create an identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut mat = Self::zeros(n, n);
        for i in 0..n {
            mat.data[i][i] = 1;
        }
        mat
    }

    /// Create a matrix from rows, rejecting ragged input.
    pub fn from_rows(data: Vec<Vec<i64>>) -> Result<Self, MatrixError> {
        let rows = data.len();
        let cols = data.first().map_or(0, |r| r.len());
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixError::ragged(i, cols, row.len()));
            }
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a square matrix from a row-major list of `n * n` entries.
    pub fn from_row_major(entries: &[i64]) -> Result<Self, MatrixError> {
        let n = (entries.len() as f64).sqrt().round() as usize;
        if n * n != entries.len() || n == 0 {
            return Err(MatrixError {
                message: format!("{} entries do not form a square matrix", entries.len()),
                kind: crate::utils::errors::MatrixErrorKind::NonSquareMatrix,
            });
        }
        Self::from_rows(entries.chunks(n).map(|c| c.to_vec()).collect())
    }

    /// Get the number of rows.
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Check if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Get an element.
    pub fn get(&self, row: usize, col: usize) -> Option<i64> {
        self.data.get(row)?.get(col).copied()
    }

    /// Set an element.
    pub fn set(&mut self, row: usize, col: usize, value: i64) {
        if row < self.rows && col < self.cols {
            self.data[row][col] = value;
        }
    }

    /// Get a row as a slice.
    pub fn row(&self, row: usize) -> &[i64] {
        &self.data[row]
    }

    /// Get a column as a vector.
    pub fn column(&self, col: usize) -> Vec<i64> {
        self.data.iter().map(|row| row[col]).collect()
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<i64>] {
        &self.data
    }

    /// Transpose the matrix.
    pub fn transpose(&self) -> Self {
        let mut result = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                result.data[j][i] = self.data[i][j];
            }
        }
        result
    }

    /// Matrix multiplication.
    pub fn mul(&self, other: &Self) -> Option<Self> {
        if self.cols != other.rows {
            return None;
        }
        let mut result = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                result.data[i][j] = (0..self.cols)
                    .map(|k| self.data[i][k] * other.data[k][j])
                    .sum();
            }
        }
        Some(result)
    }

    /// Matrix-vector multiplication.
    pub fn mul_vec(&self, vec: &[i64]) -> Option<Vec<i64>> {
        if self.cols != vec.len() {
            return None;
        }
        Some(
            self.data
                .iter()
                .map(|row| row.iter().zip(vec).map(|(a, b)| a * b).sum::<i64>())
                .collect(),
        )
    }

    fn to_rational(&self) -> Vec<Vec<Rational64>> {
        self.data
            .iter()
            .map(|row| row.iter().map(|&x| Rational64::from_integer(x)).collect())
            .collect()
    }

    /// Compute the determinant (for square matrices).
    pub fn determinant(&self) -> Option<i64> {
        if !self.is_square() {
            return None;
        }
        match self.rows {
            0 => return Some(1),
            1 => return Some(self.data[0][0]),
            2 => {
                return Some(
                    self.data[0][0] * self.data[1][1] - self.data[0][1] * self.data[1][0],
                )
            }
            _ => {}
        }

        // Fraction-exact elimination for larger matrices
        let n = self.rows;
        let mut lu = self.to_rational();
        let mut det = Rational64::from_integer(1);

        for k in 0..n {
            let mut max_row = k;
            for i in (k + 1)..n {
                if lu[i][k].abs() > lu[max_row][k].abs() {
                    max_row = i;
                }
            }
            if max_row != k {
                lu.swap(k, max_row);
                det = -det;
            }
            if lu[k][k].is_zero() {
                return Some(0);
            }
            det *= lu[k][k];
            for i in (k + 1)..n {
                let factor = lu[i][k] / lu[k][k];
                let pivot_row = lu[k].clone();
                for j in k..n {
                    lu[i][j] -= factor * pivot_row[j];
                }
            }
        }

        Some(det.to_integer())
    }

    /// Check if the matrix is unimodular (determinant is ±1).
    pub fn is_unimodular(&self) -> bool {
        matches!(self.determinant(), Some(1) | Some(-1))
    }

    /// Check if every row and column holds exactly one nonzero entry, and it is ±1.
    pub fn is_signed_permutation(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let unit_count = |entries: &mut dyn Iterator<Item = i64>| {
            let mut ones = 0;
            for x in entries {
                match x {
                    0 => {}
                    1 | -1 => ones += 1,
                    _ => return false,
                }
            }
            ones == 1
        };
        (0..self.rows).all(|i| unit_count(&mut self.data[i].iter().copied()))
            && (0..self.cols).all(|j| unit_count(&mut self.data.iter().map(|r| r[j])))
    }

    /// Check if all entries strictly above the diagonal are zero.
    pub fn is_lower_triangular(&self) -> bool {
        (0..self.rows).all(|i| ((i + 1)..self.cols).all(|j| self.data[i][j] == 0))
    }

    /// Compute `det(M) * M^-1`, an integer matrix for any non-singular `M`.
    pub fn adjugate(&self) -> Option<Self> {
        if !self.is_square() {
            return None;
        }
        let n = self.rows;
        let det = self.determinant()?;
        if det == 0 {
            return None;
        }
        if n == 2 {
            let d = &self.data;
            return Some(Self {
                data: vec![vec![d[1][1], -d[0][1]], vec![-d[1][0], d[0][0]]],
                rows: 2,
                cols: 2,
            });
        }

        // Augmented matrix [A | I]
        let zero = Rational64::from_integer(0);
        let mut aug = vec![vec![zero; 2 * n]; n];
        for (i, row) in self.to_rational().into_iter().enumerate() {
            aug[i][..n].copy_from_slice(&row);
            aug[i][n + i] = Rational64::from_integer(1);
        }

        // Gauss-Jordan elimination
        for k in 0..n {
            let mut max_row = k;
            for i in (k + 1)..n {
                if aug[i][k].abs() > aug[max_row][k].abs() {
                    max_row = i;
                }
            }
            aug.swap(k, max_row);
            if aug[k][k].is_zero() {
                return None;
            }
            let pivot = aug[k][k];
            for j in 0..(2 * n) {
                aug[k][j] /= pivot;
            }
            for i in 0..n {
                if i != k {
                    let factor = aug[i][k];
                    let pivot_row = aug[k].clone();
                    for j in 0..(2 * n) {
                        aug[i][j] -= factor * pivot_row[j];
                    }
                }
            }
        }

        let scale = Rational64::from_integer(det);
        let mut adj = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let v = aug[i][n + j] * scale;
                if !v.is_integer() {
                    return None;
                }
                adj.data[i][j] = v.to_integer();
            }
        }
        Some(adj)
    }

    /// Swap two columns.
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for row in &mut self.data {
            row.swap(a, b);
        }
    }

    /// Negate a column.
    pub fn negate_col(&mut self, col: usize) {
        for row in &mut self.data {
            row[col] = -row[col];
        }
    }

    /// `col[dst] -= factor * col[src]`.
    pub fn sub_col_multiple(&mut self, dst: usize, src: usize, factor: i64) {
        if factor == 0 {
            return;
        }
        for row in &mut self.data {
            row[dst] -= factor * row[src];
        }
    }

    /// Swap two rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
    }

    /// `row[dst] -= factor * row[src]`.
    pub fn sub_row_multiple(&mut self, dst: usize, src: usize, factor: i64) {
        if factor == 0 || dst == src {
            return;
        }
        let src_row = self.data[src].clone();
        for (x, s) in self.data[dst].iter_mut().zip(src_row) {
            *x -= factor * s;
        }
    }
}

impl Index<(usize, usize)> for IntMatrix {
    type Output = i64;

    fn index(&self, (row, col): (usize, usize)) -> &i64 {
        &self.data[row][col]
    }
}

impl fmt::Display for IntMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", val)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

/// Integer floor division (rounds toward negative infinity).
pub fn floor_div(a: i64, b: i64) -> i64 {
    Integer::div_floor(&a, &b)
}

/// Integer ceiling division (rounds toward positive infinity).
pub fn ceil_div(a: i64, b: i64) -> i64 {
    -Integer::div_floor(&-a, &b)
}

/// Least non-negative residue of `a` modulo `|m|`.
pub fn mod_floor(a: i64, m: i64) -> i64 {
    Integer::mod_floor(&a, &m.abs())
}

/// Compute the GCD of a vector of integers.
pub fn vector_gcd(v: &[i64]) -> i64 {
    v.iter().fold(0, |acc, &x| acc.gcd(&x))
}

/// Lexicographic sign of a vector: -1, 0 or 1 by its first nonzero entry.
pub fn lex_sign(v: &[i64]) -> i64 {
    v.iter().find(|&&x| x != 0).map_or(0, |x| x.signum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: Vec<Vec<i64>>) -> IntMatrix {
        IntMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_matrix_multiply() {
        let a = m(vec![vec![1, 2], vec![3, 4]]);
        let b = m(vec![vec![5, 6], vec![7, 8]]);
        let c = a.mul(&b).unwrap();
        assert_eq!(c, m(vec![vec![19, 22], vec![43, 50]]));
    }

    #[test]
    fn test_ragged_rows() {
        let err = IntMatrix::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert_eq!(err.kind, crate::utils::errors::MatrixErrorKind::RaggedRows);
    }

    #[test]
    fn test_from_row_major() {
        let a = IntMatrix::from_row_major(&[3, 2, 3, 4]).unwrap();
        assert_eq!(a, m(vec![vec![3, 2], vec![3, 4]]));
        assert!(IntMatrix::from_row_major(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_determinant() {
        assert_eq!(m(vec![vec![1, 2], vec![3, 4]]).determinant(), Some(-2));
        let three = m(vec![vec![2, 0, 1], vec![1, 3, 2], vec![1, 1, 2]]);
        assert_eq!(three.determinant(), Some(6));
        let singular = m(vec![vec![2, 0, 1], vec![1, 3, 2], vec![1, 1, 1]]);
        assert_eq!(singular.determinant(), Some(0));
        assert_eq!(m(vec![vec![1, 2, 3]]).determinant(), None);
    }

    #[test]
    fn test_adjugate() {
        let a = m(vec![vec![3, 2], vec![3, 4]]);
        assert_eq!(a.adjugate().unwrap(), m(vec![vec![4, -2], vec![-3, 3]]));

        let three = m(vec![vec![2, 0, 1], vec![1, 3, 2], vec![1, 1, 2]]);
        let det = three.determinant().unwrap();
        let product = three.mul(&three.adjugate().unwrap()).unwrap();
        let mut scaled = IntMatrix::identity(3);
        for i in 0..3 {
            scaled.set(i, i, det);
        }
        assert_eq!(product, scaled);
    }

    #[test]
    fn test_unimodular() {
        assert!(m(vec![vec![1, 1], vec![0, 1]]).is_unimodular());
        assert!(!m(vec![vec![1, 0], vec![1, 2]]).is_unimodular());
    }

    #[test]
    fn test_signed_permutation() {
        assert!(m(vec![vec![0, 1], vec![1, 0]]).is_signed_permutation());
        assert!(m(vec![vec![0, -1], vec![1, 0]]).is_signed_permutation());
        assert!(!m(vec![vec![1, 1], vec![0, 1]]).is_signed_permutation());
        assert!(!m(vec![vec![2, 0], vec![0, 1]]).is_signed_permutation());
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(mod_floor(-1, 6), 5);
        assert_eq!(vector_gcd(&[12, 8, -6]), 2);
        assert_eq!(lex_sign(&[0, -3]), -1);
    }
}
