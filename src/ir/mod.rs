//! Executable representation of loop nests.
//!
//! This module defines the objects that bound derivation produces and the
//! oracle runs:
//! - Nest: loops with symbolic bounds plus the inverse mapping
//! - Rule: the statement executed at every point
//! - Grid: the array the statement updates

pub mod grid;
pub mod nest;
pub mod rule;

pub use grid::{CellDiff, Grid};
pub use nest::{transformed_var, AffineBound, Bound, LoopNestSpec, LoopSpec, Rounding};
pub use rule::{CellExpr, UpdateRule};
