//! Hermite Normal Form by integer column operations.
//!
//! For a square non-singular `M` this computes `(A, U)` with `A = M * U`,
//! `U` unimodular and `A` lower triangular with a positive diagonal and every
//! entry left of the diagonal in `[0, A[i][i])`.
//!
//! ```text
//! M = [3 2]    U = [-1 -2]    A = M * U = [1 0]
//!     [3 4]        [ 2  3]                [5 6]
//! ```

use crate::utils::errors::MatrixError;
use crate::utils::matrix::{floor_div, IntMatrix};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Result of the HNF solver: `triangular = original * unimodular`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HermiteForm {
    /// Lower triangular form `A`
    pub triangular: IntMatrix,
    /// Accumulated column operations `U`, `det(U) = ±1`
    pub unimodular: IntMatrix,
}

impl HermiteForm {
    /// Diagonal entry `A[i][i]`.
    pub fn diagonal(&self, i: usize) -> i64 {
        self.triangular[(i, i)]
    }
}

impl fmt::Display for HermiteForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A = {}, U = {}", self.triangular, self.unimodular)
    }
}

/// Compute the Hermite Normal Form of a square integer matrix.
///
/// Singular input is not rejected: a row whose diagonal and right-hand part
/// are all zero is skipped, and the result is then meaningless.
pub fn hnf(matrix: &IntMatrix) -> Result<HermiteForm, MatrixError> {
    if !matrix.is_square() {
        return Err(MatrixError::non_square(matrix.nrows(), matrix.ncols()));
    }
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut u = IntMatrix::identity(n);

    let mut i = 0;
    while i < n {
        if ((i + 1)..n).all(|j| a[(i, j)] == 0) {
            if a[(i, i)] < 0 {
                a.negate_col(i);
                u.negate_col(i);
            }
            i += 1;
            continue;
        }

        // Smallest nonzero magnitude at or right of the diagonal; first wins ties
        let Some(pivot_col) = (i..n)
            .filter(|&j| a[(i, j)] != 0)
            .min_by_key(|&j| a[(i, j)].abs())
        else {
            i += 1;
            continue;
        };
        a.swap_cols(i, pivot_col);
        u.swap_cols(i, pivot_col);

        let pivot = a[(i, i)];
        for j in (i + 1)..n {
            let q = floor_div(a[(i, j)], pivot);
            a.sub_col_multiple(j, i, q);
            u.sub_col_multiple(j, i, q);
        }
    }

    // Reduce entries left of the diagonal into [0, diagonal). Column i is zero
    // above row i, so earlier rows are untouched.
    for i in 0..n {
        let d = a[(i, i)];
        if d == 0 {
            continue;
        }
        for j in 0..i {
            let q = floor_div(a[(i, j)], d);
            a.sub_col_multiple(j, i, q);
            u.sub_col_multiple(j, i, q);
        }
    }

    Ok(HermiteForm {
        triangular: a,
        unimodular: u,
    })
}
