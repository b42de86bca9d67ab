//! # polyremap - Affine Iteration-Space Remapping
//!
//! Derives loop bounds, steps and inverse index mappings for integer
//! transformations of rectangular iteration domains, and proves on concrete
//! inputs that a transformed nest computes what the original nest computes:
//! - Hermite Normal Form of integer matrices
//! - Closed-form bounds for permutations, skews, shears and lattice transforms
//! - A catalog of reference/transformed loop nest pairs
//! - An equivalence oracle over seeded random inputs
//!
//! ## Architecture
//!
//! ```text
//! Domain + Matrix → Lattice (HNF) → Transform (bounds) → Nest → Oracle / CodeGen
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use polyremap::prelude::*;
//!
//! let domain = IterationDomain::rect(1, 100, 1, 100)?;
//! let wavefront = TransformMatrix::from_rows(vec![vec![1, 1], vec![0, 1]])?;
//! let nest = polyremap::derive_bounds(&domain, &wavefront)?;
//! println!("{}", nest);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lattice;
pub mod ir;
pub mod polyhedral;
pub mod analysis;
pub mod transform;
pub mod catalog;
pub mod codegen;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::lattice::{HermiteForm, LatticeSteps};
    pub use crate::ir::{Bound, Grid, LoopNestSpec, LoopSpec, UpdateRule};
    pub use crate::polyhedral::{
        AffineAccess, DependencePattern, InverseMap, IterationDomain, TransformClass, TransformMatrix,
    };
    pub use crate::analysis::{
        EquivalenceOracle, ExecutionPlan, Observation, ObservedResult, SweepReport, Verdict,
    };
    pub use crate::transform::{Transform, TileConfig};
    pub use crate::catalog::{Case, CaseSpec, CatalogConfig};
    pub use crate::utils::errors::*;
    pub use crate::utils::IntMatrix;
}

use crate::utils::errors::RemapResult;

/// Derive the loop nest visiting the image of `domain` under `transform`.
pub fn derive_bounds(
    domain: &polyhedral::IterationDomain,
    transform: &polyhedral::TransformMatrix,
) -> RemapResult<ir::LoopNestSpec> {
    transform::derive_bounds(domain, transform)
}

/// Hermite Normal Form `A = M * U` of a square integer matrix.
pub fn hnf(matrix: &utils::IntMatrix) -> RemapResult<lattice::HermiteForm> {
    Ok(lattice::hnf(matrix)?)
}

/// Build the catalog with default parameters.
pub fn catalog() -> RemapResult<Vec<catalog::Case>> {
    catalog::catalog(&catalog::CatalogConfig::default())
}

/// Exact equality of two observed outputs.
pub fn compare(a: &analysis::ObservedResult, b: &analysis::ObservedResult) -> bool {
    analysis::compare(a, b)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
