//! Uniform dependence patterns.
//!
//! A pattern is a set of offsets `d` such that the iteration at `p` depends on
//! the iteration at `p + d`. Every offset is lexicographically negative, so
//! the reference (lexicographic) order always visits the source first.
//!
//! Patterns can be written down by hand or extracted from uniform affine
//! accesses: a statement that writes `A * p + w` and reads `A * p + r` touches
//! the same cell as iteration `p + δ` exactly when `A * δ = r - w`.

use crate::lattice::solve_system;
use crate::polyhedral::TransformMatrix;
use crate::utils::errors::{DerivationError, DomainError, RemapResult};
use crate::utils::matrix::{lex_sign, IntMatrix};
use log::debug;
use serde::{Serialize, Deserialize};
use std::fmt;

/// Kind of a loop-carried dependence between two iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependenceKind {
    /// Read-after-write: the read sees an earlier write
    Flow,
    /// Write-after-read: a later iteration overwrites the value read
    Anti,
}

impl DependenceKind {
    /// Get short name for the dependence kind.
    pub fn short_name(&self) -> &'static str {
        match self {
            DependenceKind::Flow => "RAW",
            DependenceKind::Anti => "WAR",
        }
    }
}

/// Set of backward offsets an iteration depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencePattern {
    dim: usize,
    offsets: Vec<Vec<i64>>,
}

impl DependencePattern {
    /// Build a pattern, checking lengths and orientation of every offset.
    pub fn new(dim: usize, offsets: Vec<Vec<i64>>) -> Result<Self, DerivationError> {
        let mut pattern = Self {
            dim,
            offsets: Vec::with_capacity(offsets.len()),
        };
        for offset in offsets {
            if offset.len() != dim || lex_sign(&offset) >= 0 {
                return Err(DerivationError::forward_offset(&offset));
            }
            pattern.insert(offset);
        }
        Ok(pattern)
    }

    /// A pattern with no dependences.
    pub fn empty(dim: usize) -> Self {
        Self {
            dim,
            offsets: Vec::new(),
        }
    }

    fn insert(&mut self, offset: Vec<i64>) {
        if !self.offsets.contains(&offset) {
            self.offsets.push(offset);
        }
    }

    /// Extract the pattern of a statement from its write and read accesses.
    ///
    /// Reads that never alias the written cell of another iteration
    /// contribute nothing. Reads of the cell written by the same iteration
    /// are loop-independent and also contribute nothing.
    pub fn from_accesses(write: &AffineAccess, reads: &[AffineAccess]) -> RemapResult<Self> {
        let dim = write.matrix.ncols();
        let mut pattern = Self::empty(dim);

        for read in reads {
            if read.matrix != write.matrix {
                return Err(DerivationError::non_uniform(format!(
                    "read {} and write {} have different linear parts",
                    read, write
                ))
                .into());
            }
            if read.offset.len() != write.offset.len() {
                return Err(DomainError::dimension_mismatch(write.offset.len(), read.offset.len()).into());
            }
            let rhs: Vec<i64> = read
                .offset
                .iter()
                .zip(&write.offset)
                .map(|(r, w)| r - w)
                .collect();

            let Some(delta) = solve_system(&write.matrix, &rhs)? else {
                debug!("read {} never aliases write {}", read, write);
                continue;
            };
            let (offset, kind) = match lex_sign(&delta) {
                0 => continue,
                s if s < 0 => (delta, DependenceKind::Flow),
                _ => (delta.iter().map(|d| -d).collect(), DependenceKind::Anti),
            };
            debug!("{} dependence on {:?} via read {}", kind.short_name(), offset, read);
            pattern.insert(offset);
        }

        Ok(pattern)
    }

    /// Number of axes.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The dependence offsets.
    pub fn offsets(&self) -> &[Vec<i64>] {
        &self.offsets
    }

    /// Check if there are no dependences.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets whose image under `transform` is not lexicographically negative.
    pub fn violations(&self, transform: &TransformMatrix) -> Vec<Vec<i64>> {
        if transform.dim() != self.dim {
            return self.offsets.clone();
        }
        self.offsets
            .iter()
            .filter(|d| lex_sign(&transform.apply(d)) >= 0)
            .cloned()
            .collect()
    }

    /// Check if the lexicographic order of `T * p` still visits every source
    /// before its consumer.
    pub fn is_respected_by(&self, transform: &TransformMatrix) -> bool {
        self.violations(transform).is_empty()
    }
}

impl fmt::Display for DependencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, offset) in self.offsets.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            let parts: Vec<String> = offset.iter().map(|v| v.to_string()).collect();
            write!(f, "({})", parts.join(","))?;
        }
        write!(f, "}}")
    }
}

/// An affine array access `matrix * p + offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineAccess {
    /// Linear part
    pub matrix: IntMatrix,
    /// Constant part
    pub offset: Vec<i64>,
}

impl AffineAccess {
    /// Create an access.
    pub fn new(matrix: IntMatrix, offset: Vec<i64>) -> Self {
        Self { matrix, offset }
    }

    /// `p + offset`, the shape of every stencil access.
    pub fn uniform(offset: Vec<i64>) -> Self {
        Self {
            matrix: IntMatrix::identity(offset.len()),
            offset,
        }
    }
}

impl fmt::Display for AffineAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} * p + {:?}", self.matrix, self.offset)
    }
}

/// Check if a statement carries a dependence across iterations.
pub fn has_loop_carried_dependence(write: &AffineAccess, reads: &[AffineAccess]) -> RemapResult<bool> {
    Ok(!DependencePattern::from_accesses(write, reads)?.is_empty())
}
