//! Error types for the remapping engine.
//!
//! Errors are grouped by the phase that produces them. Structural errors
//! (matrix shape, empty domains, unsupported transforms) abort the single
//! operation; equivalence mismatches are normally reported as verdicts and
//! only surface here when a caller asks for a hard failure.

use thiserror::Error;
use std::fmt;

/// Top-level error type for the engine.
#[derive(Error, Debug)]
pub enum RemapError {
    /// Error in matrix structure or arithmetic
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Error in an iteration domain or array shape
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Error during bound derivation or its verification
    #[error("Bounds derivation error: {0}")]
    Derivation(#[from] DerivationError),

    /// Reference and transformed nests disagree
    #[error("Equivalence error: {0}")]
    Equivalence(#[from] EquivalenceError),

    /// Serialization of a report failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemapError {
    /// The matrix error kind, if this is a matrix error.
    pub fn matrix_kind(&self) -> Option<MatrixErrorKind> {
        match self {
            RemapError::Matrix(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The derivation error kind, if this is a derivation error.
    pub fn derivation_kind(&self) -> Option<DerivationErrorKind> {
        match self {
            RemapError::Derivation(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The domain error kind, if this is a domain error.
    pub fn domain_kind(&self) -> Option<DomainErrorKind> {
        match self {
            RemapError::Domain(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Error in matrix structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct MatrixError {
    /// The error message
    pub message: String,
    /// The kind of matrix error
    pub kind: MatrixErrorKind,
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl MatrixError {
    /// A square matrix was required.
    pub fn non_square(rows: usize, cols: usize) -> Self {
        Self {
            message: format!("expected a square matrix, got {}x{}", rows, cols),
            kind: MatrixErrorKind::NonSquareMatrix,
        }
    }

    /// The determinant is zero.
    pub fn singular() -> Self {
        Self {
            message: "transform has determinant 0 and no inverse".to_string(),
            kind: MatrixErrorKind::SingularTransform,
        }
    }

    /// Rows of different lengths.
    pub fn ragged(row: usize, expected: usize, found: usize) -> Self {
        Self {
            message: format!("row {} has {} entries, expected {}", row, found, expected),
            kind: MatrixErrorKind::RaggedRows,
        }
    }

    /// Operand sizes disagree.
    pub fn dimension_mismatch(expected: usize, found: usize) -> Self {
        Self {
            message: format!("dimension mismatch: expected {}, found {}", expected, found),
            kind: MatrixErrorKind::DimensionMismatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixErrorKind {
    /// Operation needs a square matrix
    NonSquareMatrix,
    /// Determinant is zero
    SingularTransform,
    /// Rows have different lengths
    RaggedRows,
    /// Matrix/vector sizes disagree
    DimensionMismatch,
}

/// Error in an iteration domain or grid shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    /// The error message
    pub message: String,
    /// The kind of domain error
    pub kind: DomainErrorKind,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl DomainError {
    /// An axis with `lower >= upper`.
    pub fn empty_axis(axis: usize, lower: i64, upper: i64) -> Self {
        Self {
            message: format!("axis {} is empty: [{}, {})", axis, lower, upper),
            kind: DomainErrorKind::EmptyAxis,
        }
    }

    /// Point or bound vector of the wrong length.
    pub fn dimension_mismatch(expected: usize, found: usize) -> Self {
        Self {
            message: format!("expected {} coordinates, found {}", expected, found),
            kind: DomainErrorKind::DimensionMismatch,
        }
    }

    /// Cell values drawn from `0..=max_value` with a negative maximum.
    pub fn empty_value_range(max_value: i64) -> Self {
        Self {
            message: format!("value range 0..={} is empty", max_value),
            kind: DomainErrorKind::EmptyValueRange,
        }
    }

    /// Access outside an array shape.
    pub fn out_of_bounds(point: &[i64], shape: impl fmt::Display) -> Self {
        Self {
            message: format!("point {:?} lies outside {}", point, shape),
            kind: DomainErrorKind::OutOfBounds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainErrorKind {
    /// Lower bound not below upper bound
    EmptyAxis,
    /// Wrong number of coordinates
    DimensionMismatch,
    /// Access outside the array
    OutOfBounds,
    /// No value to draw random cells from
    EmptyValueRange,
}

/// Error during bound derivation or verification of a derived nest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct DerivationError {
    /// The error message
    pub message: String,
    /// The kind of derivation error
    pub kind: DerivationErrorKind,
}

impl fmt::Display for DerivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl DerivationError {
    /// The derived nest does not visit the domain exactly once.
    pub fn mismatch(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: DerivationErrorKind::BoundsDerivationMismatch,
        }
    }

    /// A dependence source was visited after its consumer.
    pub fn dependence_order(source: &[i64], sink: &[i64]) -> Self {
        Self {
            message: format!("{:?} depends on {:?} but is visited first", sink, source),
            kind: DerivationErrorKind::DependenceOrderViolation,
        }
    }

    /// A dependence offset that does not point backwards in the reference order.
    pub fn forward_offset(offset: &[i64]) -> Self {
        Self {
            message: format!("dependence offset {:?} is not lexicographically negative", offset),
            kind: DerivationErrorKind::DependenceOrderViolation,
        }
    }

    /// No closed-form derivation for this transform class.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: DerivationErrorKind::UnsupportedTransform,
        }
    }

    /// Write and read accesses have different linear parts.
    pub fn non_uniform(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: DerivationErrorKind::NonUniformAccess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationErrorKind {
    /// Visited point set differs from the domain
    BoundsDerivationMismatch,
    /// A dependence was visited out of order
    DependenceOrderViolation,
    /// Transform class not covered by closed-form derivation
    UnsupportedTransform,
    /// Dependence extraction needs uniform accesses
    NonUniformAccess,
}

/// Reference and transformed nests disagree on a concrete instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceError {
    /// The error message
    pub message: String,
    /// The case that failed
    pub case: String,
    /// The kind of equivalence error
    pub kind: EquivalenceErrorKind,
}

impl fmt::Display for EquivalenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.message, self.case)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquivalenceErrorKind {
    /// Outputs differ
    EquivalenceMismatch,
    /// Outputs are not comparable (different shapes or observations)
    ShapeMismatch,
}

/// Result type using RemapError.
pub type RemapResult<T> = Result<T, RemapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: RemapError = MatrixError::non_square(2, 3).into();
        let s = format!("{}", err);
        assert!(s.contains("Matrix error"));
        assert!(s.contains("2x3"));
        assert_eq!(err.matrix_kind(), Some(MatrixErrorKind::NonSquareMatrix));
    }

    #[test]
    fn test_equivalence_display() {
        let err = EquivalenceError {
            message: "3 of 10 runs differ".to_string(),
            case: "general".to_string(),
            kind: EquivalenceErrorKind::EquivalenceMismatch,
        };
        assert_eq!(err.to_string(), "3 of 10 runs differ in general");
    }
}
