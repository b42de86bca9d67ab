//! Equivalence oracle for reference and transformed loop nests.
//!
//! The oracle runs both nests over independent deep copies of the same input
//! and compares what the caller chose to observe. A disagreement is a
//! verdict, not an error: the report keeps both outputs so they can be dumped
//! and diffed offline. Only structural problems (an out-of-bounds read, a
//! point off the image lattice) come back as `Err`.

use crate::ir::{CellDiff, Grid, LoopNestSpec, UpdateRule};
use crate::utils::errors::{
    DerivationErrorKind, DomainError, EquivalenceError, EquivalenceErrorKind, RemapResult,
};
use log::{info, warn};
use serde::{Serialize, Deserialize};

/// What part of a run is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observation {
    /// The whole array
    Array,
    /// One designated cell
    Cell(Vec<i64>),
    /// The set of visited original points, ignoring order
    VisitedSet,
}

/// The observed output of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedResult {
    /// Final array contents
    Array(Grid),
    /// Final value of the designated cell
    Cell(i64),
    /// Visited original points, sorted
    Visited(Vec<Vec<i64>>),
}

/// Exact equality of two observed outputs.
pub fn compare(a: &ObservedResult, b: &ObservedResult) -> bool {
    a == b
}

/// Both outputs of a failed comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchReport {
    /// Name of the compared pair
    pub case: String,
    /// Seed of the input, if it was generated
    pub seed: Option<u64>,
    /// Output of the reference nest
    pub expected: ObservedResult,
    /// Output of the transformed nest
    pub actual: ObservedResult,
    /// Differing cells when whole arrays are observed
    pub differing_cells: Vec<CellDiff>,
}

/// Outcome of one oracle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Outputs are identical
    Pass,
    /// Outputs differ
    Mismatch(Box<MismatchReport>),
}

impl Verdict {
    /// Check if the outputs matched.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Runs a reference and a transformed nest with the same update rule.
#[derive(Debug, Clone)]
pub struct EquivalenceOracle<'a> {
    reference: &'a LoopNestSpec,
    transformed: &'a LoopNestSpec,
    rule: &'a UpdateRule,
    observation: Observation,
    name: String,
}

impl<'a> EquivalenceOracle<'a> {
    /// Create an oracle.
    pub fn new(
        reference: &'a LoopNestSpec,
        transformed: &'a LoopNestSpec,
        rule: &'a UpdateRule,
        observation: Observation,
    ) -> Self {
        Self {
            reference,
            transformed,
            rule,
            observation,
            name: rule.name.clone(),
        }
    }

    /// Name used in reports.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn run(&self, nest: &LoopNestSpec, input: &Grid, aux: Option<&Grid>) -> RemapResult<ObservedResult> {
        if let Observation::VisitedSet = self.observation {
            let mut visited = nest.iteration_points()?;
            visited.sort();
            return Ok(ObservedResult::Visited(visited));
        }
        let mut grid = input.clone();
        nest.visit(|p: &[i64]| self.rule.apply(&mut grid, aux, p))?;
        Ok(match &self.observation {
            Observation::Cell(point) => ObservedResult::Cell(grid.get(point)?),
            _ => ObservedResult::Array(grid),
        })
    }

    /// Run both nests on copies of `input` and compare the observations.
    pub fn check(&self, input: &Grid, aux: Option<&Grid>) -> RemapResult<Verdict> {
        self.check_seeded(input, aux, None)
    }

    fn check_seeded(&self, input: &Grid, aux: Option<&Grid>, seed: Option<u64>) -> RemapResult<Verdict> {
        if self.reference.domain != self.transformed.domain {
            return Err(EquivalenceError {
                message: format!(
                    "nests cover {} and {}",
                    self.reference.domain, self.transformed.domain
                ),
                case: self.name.clone(),
                kind: EquivalenceErrorKind::ShapeMismatch,
            }
            .into());
        }
        let expected = self.run(self.reference, input, aux)?;
        let actual = self.run(self.transformed, input, aux)?;
        if compare(&expected, &actual) {
            return Ok(Verdict::Pass);
        }
        let differing_cells = match (&expected, &actual) {
            (ObservedResult::Array(a), ObservedResult::Array(b)) => a.diff(b).unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(Verdict::Mismatch(Box::new(MismatchReport {
            case: self.name.clone(),
            seed,
            expected,
            actual,
            differing_cells,
        })))
    }
}

/// How a sweep runs, supplied at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Number of random inputs per case
    pub seeds: usize,
    /// Seed of the first input; later inputs use consecutive seeds
    pub base_seed: u64,
    /// Random cells are drawn from `0..=max_value`
    pub max_value: i64,
    /// Run the equivalence oracle
    pub check_equivalence: bool,
    /// Check coverage and dependence order of every transformed nest
    pub verify_coverage: bool,
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self {
            seeds: 10,
            base_seed: 0,
            max_value: 10,
            check_equivalence: true,
            verify_coverage: true,
        }
    }
}

/// One pair to sweep: the oracle inputs plus how to build them.
pub trait SweepCase {
    /// Name used in reports.
    fn name(&self) -> &str;
    /// Reference nest.
    fn reference(&self) -> &LoopNestSpec;
    /// Transformed nest.
    fn transformed(&self) -> &LoopNestSpec;
    /// Update rule run by both nests.
    fn rule(&self) -> &UpdateRule;
    /// What to compare.
    fn observation(&self) -> Observation;
    /// Input array for a seed.
    fn input(&self, seed: u64, max_value: i64) -> Grid;
    /// Auxiliary read-only array, if the rule uses one.
    fn aux(&self) -> Option<&Grid>;
    /// Static checks run before the oracle.
    ///
    /// A `DependenceOrderViolation` is reported by `sweep` and does not stop
    /// it; any other error does.
    fn verify(&self) -> RemapResult<()>;
}

/// Pass/fail counts of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Runs whose outputs matched
    pub passed: usize,
    /// Runs whose outputs differed
    pub failed: usize,
    /// Reports of the failed runs
    pub mismatches: Vec<MismatchReport>,
}

impl SweepReport {
    /// Check if every run passed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Turn any mismatch into a hard error.
    pub fn into_result(self) -> Result<Self, EquivalenceError> {
        match self.mismatches.first() {
            None => Ok(self),
            Some(first) => Err(EquivalenceError {
                message: format!("{} of {} runs differ", self.failed, self.passed + self.failed),
                case: first.case.clone(),
                kind: EquivalenceErrorKind::EquivalenceMismatch,
            }),
        }
    }
}

/// Run every case over `plan.seeds` random inputs.
///
/// Mismatches are logged and counted. A transform that visits a dependence
/// source too late is only logged, and its oracle runs still count. Coverage
/// failures and other structural errors abort the sweep.
pub fn sweep<C: SweepCase>(cases: &[C], plan: &ExecutionPlan) -> RemapResult<SweepReport> {
    if plan.max_value < 0 {
        return Err(DomainError::empty_value_range(plan.max_value).into());
    }
    let mut report = SweepReport::default();

    for case in cases {
        if plan.verify_coverage {
            match case.verify() {
                Err(err) if err.derivation_kind() == Some(DerivationErrorKind::DependenceOrderViolation) => {
                    warn!("{}: {}", case.name(), err);
                }
                other => other?,
            }
        }
        if !plan.check_equivalence {
            continue;
        }
        let oracle = EquivalenceOracle::new(case.reference(), case.transformed(), case.rule(), case.observation())
            .named(case.name());
        for k in 0..plan.seeds as u64 {
            let seed = plan.base_seed.wrapping_add(k);
            let input = case.input(seed, plan.max_value);
            match oracle.check_seeded(&input, case.aux(), Some(seed))? {
                Verdict::Pass => report.passed += 1,
                Verdict::Mismatch(mismatch) => {
                    warn!(
                        "{}: seed {} differs in {} cells",
                        case.name(),
                        seed,
                        mismatch.differing_cells.len()
                    );
                    report.failed += 1;
                    report.mismatches.push(*mismatch);
                }
            }
        }
    }

    info!(
        "sweep over {} cases: {} passed, {} failed",
        cases.len(),
        report.passed,
        report.failed
    );
    Ok(report)
}
