//! Utility modules for the remapping engine.
//!
//! - Error types
//! - Integer matrix operations
//! - Text formatting for rendered nests

pub mod errors;
pub mod matrix;
pub mod pretty;

// Re-exports
pub use errors::*;
pub use matrix::IntMatrix;
