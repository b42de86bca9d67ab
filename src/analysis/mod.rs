//! Checks that a derived loop nest is correct.

pub mod coverage;
pub mod oracle;

pub use coverage::{verify_coverage, verify_dependence_order};
pub use oracle::{
    compare, sweep, EquivalenceOracle, ExecutionPlan, MismatchReport, ObservedResult, Observation,
    SweepCase, SweepReport, Verdict,
};
