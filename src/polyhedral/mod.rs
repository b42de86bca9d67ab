//! Iteration domains, integer transforms and dependence patterns.
//!
//! This module provides the mathematical objects the engine works on:
//! - Rectangular iteration domains
//! - Non-singular integer transforms and their exact inverses
//! - Uniform dependence patterns

pub mod domain;
pub mod map;
pub mod dependence;

pub use domain::{IterationDomain, Points};
pub use map::{InverseMap, TransformClass, TransformMatrix};
pub use dependence::{has_loop_carried_dependence, AffineAccess, DependenceKind, DependencePattern};
