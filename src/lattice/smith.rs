//! Diagonal form by unimodular row and column operations, and integer
//! linear system solving on top of it.
//!
//! `diagonalize(M)` returns `(L, D, R)` with `L * M * R = D` diagonal. The
//! divisibility chain of a true Smith form is not enforced; solving only
//! needs a diagonal.

use crate::utils::errors::MatrixError;
use crate::utils::matrix::{floor_div, IntMatrix};

/// `left * original * right = diagonal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagonalForm {
    /// Row operations, `det = ±1`
    pub left: IntMatrix,
    /// Diagonal matrix with the shape of the original
    pub diagonal: IntMatrix,
    /// Column operations, `det = ±1`
    pub right: IntMatrix,
}

/// Column in `row` (from `start`) holding the smallest nonzero magnitude,
/// if the row has at least two nonzeros there.
fn row_pivot(m: &IntMatrix, row: usize, start: usize) -> Option<usize> {
    let nonzero: Vec<usize> = (start..m.ncols()).filter(|&c| m[(row, c)] != 0).collect();
    if nonzero.len() < 2 {
        return None;
    }
    nonzero.into_iter().min_by_key(|&c| m[(row, c)].abs())
}

fn col_pivot(m: &IntMatrix, col: usize, start: usize) -> Option<usize> {
    let nonzero: Vec<usize> = (start..m.nrows()).filter(|&r| m[(r, col)] != 0).collect();
    if nonzero.len() < 2 {
        return None;
    }
    nonzero.into_iter().min_by_key(|&r| m[(r, col)].abs())
}

/// Diagonalize an integer matrix of any shape.
pub fn diagonalize(matrix: &IntMatrix) -> DiagonalForm {
    let (h, w) = (matrix.nrows(), matrix.ncols());
    let mut d = matrix.clone();
    let mut left = IntMatrix::identity(h);
    let mut right = IntMatrix::identity(w);

    for k in 0..h.min(w) {
        loop {
            if let Some(c) = row_pivot(&d, k, k) {
                let pivot = d[(k, c)];
                for col in k..w {
                    if col != c {
                        let q = floor_div(d[(k, col)], pivot);
                        d.sub_col_multiple(col, c, q);
                        right.sub_col_multiple(col, c, q);
                    }
                }
                continue;
            }
            if let Some(c) = (k..w).find(|&c| d[(k, c)] != 0) {
                d.swap_cols(k, c);
                right.swap_cols(k, c);
            }

            if let Some(r) = col_pivot(&d, k, k) {
                let pivot = d[(r, k)];
                for row in k..h {
                    if row != r {
                        let q = floor_div(d[(row, k)], pivot);
                        d.sub_row_multiple(row, r, q);
                        left.sub_row_multiple(row, r, q);
                    }
                }
                continue;
            }
            if let Some(r) = (k..h).find(|&r| d[(r, k)] != 0) {
                d.swap_rows(k, r);
                left.swap_rows(k, r);
            }

            // A row swap can bring in a row with more nonzeros
            if row_pivot(&d, k, k).is_none() {
                break;
            }
        }
    }

    DiagonalForm {
        left,
        diagonal: d,
        right,
    }
}

/// Find an integer `x` with `a * x = b`, if one exists.
pub fn solve_system(a: &IntMatrix, b: &[i64]) -> Result<Option<Vec<i64>>, MatrixError> {
    if a.nrows() != b.len() {
        return Err(MatrixError::dimension_mismatch(a.nrows(), b.len()));
    }
    let (h, w) = (a.nrows(), a.ncols());
    let form = diagonalize(a);
    let c = form
        .left
        .mul_vec(b)
        .ok_or_else(|| MatrixError::dimension_mismatch(h, b.len()))?;

    // D * y = c, then x = R * y
    let mut y = vec![0i64; w];
    for (i, &ci) in c.iter().enumerate() {
        let di = if i < w { form.diagonal[(i, i)] } else { 0 };
        if di == 0 {
            if ci != 0 {
                return Ok(None);
            }
        } else {
            if ci % di != 0 {
                return Ok(None);
            }
            y[i] = ci / di;
        }
    }

    Ok(form.right.mul_vec(&y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: Vec<Vec<i64>>) -> IntMatrix {
        IntMatrix::from_rows(rows).unwrap()
    }

    fn is_diagonal(d: &IntMatrix) -> bool {
        (0..d.nrows()).all(|i| (0..d.ncols()).all(|j| i == j || d[(i, j)] == 0))
    }

    #[test]
    fn test_diagonalize_square() {
        let a = m(vec![vec![2, 4, 4], vec![-6, 6, 12], vec![10, -4, -16]]);
        let form = diagonalize(&a);
        assert!(is_diagonal(&form.diagonal));
        let product = form.left.mul(&a).unwrap().mul(&form.right).unwrap();
        assert_eq!(product, form.diagonal);
        assert!(form.left.is_unimodular());
        assert!(form.right.is_unimodular());
    }

    #[test]
    fn test_diagonalize_wide() {
        let a = m(vec![vec![1, -1, 2], vec![0, 3, 3]]);
        let form = diagonalize(&a);
        assert!(is_diagonal(&form.diagonal));
        let product = form.left.mul(&a).unwrap().mul(&form.right).unwrap();
        assert_eq!(product, form.diagonal);
    }

    #[test]
    fn test_solve_unique() {
        let a = m(vec![vec![3, 2], vec![3, 4]]);
        let x = solve_system(&a, &[12, 18]).unwrap().unwrap();
        assert_eq!(a.mul_vec(&x).unwrap(), vec![12, 18]);
        assert_eq!(x, vec![2, 3]);
    }

    #[test]
    fn test_solve_no_integer_solution() {
        let a = m(vec![vec![2, 0], vec![0, 2]]);
        assert_eq!(solve_system(&a, &[1, 0]).unwrap(), None);
    }

    #[test]
    fn test_solve_underdetermined() {
        let a = m(vec![vec![2, 4]]);
        let x = solve_system(&a, &[6]).unwrap().unwrap();
        assert_eq!(a.mul_vec(&x).unwrap(), vec![6]);
        assert_eq!(solve_system(&a, &[5]).unwrap(), None);
    }

    #[test]
    fn test_solve_inconsistent_rows() {
        let a = m(vec![vec![1], vec![1]]);
        assert_eq!(solve_system(&a, &[1, 2]).unwrap(), None);
        assert_eq!(solve_system(&a, &[4, 4]).unwrap(), Some(vec![4]));
    }

    #[test]
    fn test_solve_dimension_mismatch() {
        let a = m(vec![vec![1, 0], vec![0, 1]]);
        assert!(solve_system(&a, &[1]).is_err());
    }
}
