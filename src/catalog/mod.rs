//! Catalog of paired reference and transformed loop nests.
//!
//! Each case names a domain, a transform, the dependences of its update
//! rule and what the oracle observes. Both nests of a pair are built
//! mechanically: the reference is the identity nest over the domain and the
//! transformed nest comes from `derive_bounds`.

use crate::analysis::{verify_dependence_order, EquivalenceOracle, Observation, SweepCase};
use crate::ir::{Grid, LoopNestSpec, UpdateRule};
use crate::polyhedral::{DependencePattern, IterationDomain, TransformMatrix};
use crate::transform::{derive_bounds, Shear, Skewing, TileConfig, Transform};
use crate::utils::errors::{DomainError, RemapResult};
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};

/// Parameters of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Side of the square array
    pub size: i64,
    /// Placement of the sub-tile
    pub tile: TileConfig,
    /// Outer slant of the sheared tile
    pub shear_r: i64,
    /// Inner stretch of the sheared tile
    pub shear_t: i64,
    /// Matrix of the general case
    pub general: Vec<Vec<i64>>,
    /// First LCS string
    pub lcs_left: String,
    /// Second LCS string
    pub lcs_right: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            size: 100,
            tile: TileConfig::default(),
            shear_r: 2,
            shear_t: 1,
            general: vec![vec![3, 2], vec![3, 4]],
            lcs_left: "XMJYAUZBBAABABADDD".to_string(),
            lcs_right: "MZJAWXUABBAABAB".to_string(),
        }
    }
}

/// How the input array of a case is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// Random values from the seed
    Random,
    /// All zeros, for recurrences with fixed boundary values
    Zeros,
}

/// Everything needed to build a case.
#[derive(Debug, Clone)]
pub struct CaseSpec {
    /// Case name
    pub name: String,
    /// Iteration domain
    pub domain: IterationDomain,
    /// Shape of the updated array
    pub array_shape: IterationDomain,
    /// Transform applied to the domain
    pub transform: TransformMatrix,
    /// Dependences of the update rule
    pub dependences: DependencePattern,
    /// Statement executed at every point
    pub rule: UpdateRule,
    /// What the oracle compares
    pub observation: Observation,
    /// Input initialisation
    pub input: InputKind,
    /// Read-only auxiliary array
    pub aux: Option<Grid>,
}

/// A built reference/transformed pair.
#[derive(Debug, Clone)]
pub struct Case {
    /// Case name
    pub name: String,
    /// Identity nest
    pub reference: LoopNestSpec,
    /// Derived nest
    pub transformed: LoopNestSpec,
    /// Dependences of the update rule
    pub dependences: DependencePattern,
    /// Statement executed at every point
    pub rule: UpdateRule,
    /// What the oracle compares
    pub observation: Observation,
    /// Shape of the updated array
    pub array_shape: IterationDomain,
    /// Input initialisation
    pub input: InputKind,
    /// Read-only auxiliary array
    pub aux: Option<Grid>,
}

impl Case {
    /// Derive both nests of a case.
    ///
    /// Fails if any read of the rule leaves the array. A transform that does
    /// not statically respect the dependences is only logged, so the oracle
    /// can demonstrate the mismatch.
    pub fn build(spec: CaseSpec) -> RemapResult<Self> {
        let CaseSpec {
            name,
            domain,
            array_shape,
            transform,
            dependences,
            rule,
            observation,
            input,
            aux,
        } = spec;

        for offset in rule.reads() {
            let touched = domain.translate(&offset)?;
            if let Some(corner) = touched.corners().into_iter().find(|c| !array_shape.contains(c)) {
                return Err(DomainError::out_of_bounds(&corner, &array_shape).into());
            }
        }
        if let Observation::Cell(point) = &observation {
            if !array_shape.contains(point) {
                return Err(DomainError::out_of_bounds(point, &array_shape).into());
            }
        }

        let extracted = rule.dependence_pattern(domain.dim())?;
        if extracted != dependences {
            debug!("{}: rule carries {}, declared {}", name, extracted, dependences);
        }
        let violations = dependences.violations(&transform);
        if !violations.is_empty() {
            warn!("{}: transform {} reverses dependences {:?}", name, transform, violations);
        }

        let reference = LoopNestSpec::reference(&domain).with_body(rule.clone());
        let transformed = derive_bounds(&domain, &transform)?.with_body(rule.clone());
        debug!("{}: transformed nest\n{}", name, transformed);

        Ok(Self {
            name,
            reference,
            transformed,
            dependences,
            rule,
            observation,
            array_shape,
            input,
            aux,
        })
    }

    /// Oracle over this pair.
    pub fn oracle(&self) -> EquivalenceOracle<'_> {
        EquivalenceOracle::new(&self.reference, &self.transformed, &self.rule, self.observation.clone())
            .named(&self.name)
    }

    /// Run one nest of the pair on a copy of `input`.
    pub fn execute(&self, nest: &LoopNestSpec, input: &Grid) -> RemapResult<Grid> {
        let mut grid = input.clone();
        nest.run(&mut grid, self.aux.as_ref())?;
        Ok(grid)
    }
}

impl SweepCase for Case {
    fn name(&self) -> &str {
        &self.name
    }

    fn reference(&self) -> &LoopNestSpec {
        &self.reference
    }

    fn transformed(&self) -> &LoopNestSpec {
        &self.transformed
    }

    fn rule(&self) -> &UpdateRule {
        &self.rule
    }

    fn observation(&self) -> Observation {
        self.observation.clone()
    }

    fn input(&self, seed: u64, max_value: i64) -> Grid {
        match self.input {
            InputKind::Random => Grid::random(self.array_shape.clone(), seed, max_value),
            InputKind::Zeros => Grid::zeros(self.array_shape.clone()),
        }
    }

    fn aux(&self) -> Option<&Grid> {
        self.aux.as_ref()
    }

    fn verify(&self) -> RemapResult<()> {
        verify_dependence_order(&self.transformed, &self.dependences)
    }
}

fn pattern(offsets: &[[i64; 2]]) -> RemapResult<DependencePattern> {
    Ok(DependencePattern::new(2, offsets.iter().map(|o| o.to_vec()).collect())?)
}

fn stencil_rule() -> UpdateRule {
    UpdateRule::stencil("stencil", &[&[-1, 0], &[0, -1]])
}

/// Array case over `domain` inside the `size x size` array.
fn array_case(
    name: &str,
    size: i64,
    domain: IterationDomain,
    transform: TransformMatrix,
    dependences: DependencePattern,
    rule: UpdateRule,
) -> RemapResult<CaseSpec> {
    Ok(CaseSpec {
        name: name.to_string(),
        domain,
        array_shape: IterationDomain::square(2, size)?,
        transform,
        dependences,
        rule,
        observation: Observation::Array,
        input: InputKind::Random,
        aux: None,
    })
}

/// The LCS table of two strings under the wavefront transform.
pub fn lcs_case(left: &str, right: &str) -> RemapResult<CaseSpec> {
    let u: Vec<char> = left.chars().collect();
    let v: Vec<char> = right.chars().collect();
    let (m, n) = (u.len() as i64, v.len() as i64);
    let array_shape = IterationDomain::rect(0, m + 1, 0, n + 1)?;
    let matches = Grid::from_fn(array_shape.clone(), |p| {
        let (i, j) = (p[0] as usize, p[1] as usize);
        i64::from(i > 0 && j > 0 && u[i - 1] == v[j - 1])
    });
    Ok(CaseSpec {
        name: "lcs".to_string(),
        domain: IterationDomain::rect(1, m + 1, 1, n + 1)?,
        array_shape,
        transform: Skewing::wavefront(0, 1).matrix(2)?,
        dependences: pattern(&[[-1, 0], [0, -1], [-1, -1]])?,
        rule: UpdateRule::lcs(),
        observation: Observation::Cell(vec![m, n]),
        input: InputKind::Zeros,
        aux: Some(matches),
    })
}

/// Length of the longest common subsequence, computed by the transformed nest.
pub fn lcs_length(left: &str, right: &str) -> RemapResult<i64> {
    if left.is_empty() || right.is_empty() {
        return Ok(0);
    }
    let case = Case::build(lcs_case(left, right)?)?;
    let table = case.execute(&case.transformed, &Grid::zeros(case.array_shape.clone()))?;
    let m = left.chars().count() as i64;
    let n = right.chars().count() as i64;
    Ok(table.get(&[m, n])?)
}

/// Every catalog case, before derivation.
pub fn catalog_specs(config: &CatalogConfig) -> RemapResult<Vec<CaseSpec>> {
    let n = config.size;
    let tile = config.tile.domain()?;
    let stencil = pattern(&[[-1, 0], [0, -1]])?;
    let wavefront = Skewing::wavefront(0, 1).matrix(2)?;

    Ok(vec![
        array_case(
            "identity",
            n,
            IterationDomain::rect(1, n, 1, n)?,
            TransformMatrix::identity(2),
            stencil.clone(),
            stencil_rule(),
        )?,
        array_case(
            "interchange",
            n,
            IterationDomain::rect(0, n, 2, n)?,
            TransformMatrix::interchange(2, 0, 1),
            pattern(&[[0, -1], [0, -2]])?,
            UpdateRule::stencil("interchange", &[&[0, -1], &[0, -2]]),
        )?,
        array_case(
            "wavefront",
            n,
            IterationDomain::rect(1, n, 1, n)?,
            wavefront.clone(),
            stencil.clone(),
            stencil_rule(),
        )?,
        array_case("sub_tile", n, tile.clone(), wavefront, stencil.clone(), stencil_rule())?,
        array_case(
            "skew",
            n,
            tile.clone(),
            TransformMatrix::from_rows(vec![vec![1, 0], vec![1, 2]])?,
            pattern(&[[-1, 0], [0, -1], [-1, 1]])?,
            UpdateRule::stencil("skew", &[&[-1, 0], &[0, -1], &[1, -1]]),
        )?,
        array_case(
            "sheared_tile",
            n,
            tile.clone(),
            Shear::new(config.shear_r, config.shear_t).matrix(2)?,
            stencil.clone(),
            stencil_rule(),
        )?,
        array_case(
            "sheared_lattice",
            n,
            tile.clone(),
            TransformMatrix::from_rows(vec![vec![1, 1], vec![0, 2]])?,
            stencil,
            stencil_rule(),
        )?,
        array_case(
            "general",
            n,
            tile,
            TransformMatrix::from_rows(config.general.clone())?,
            pattern(&[[-1, 0], [0, -1], [-1, 1]])?,
            UpdateRule::stencil("general", &[&[-1, 0], &[0, -1], &[1, -1]]),
        )?,
        lcs_case(&config.lcs_left, &config.lcs_right)?,
    ])
}

/// Build every catalog case.
pub fn catalog(config: &CatalogConfig) -> RemapResult<Vec<Case>> {
    let cases = catalog_specs(config)?
        .into_iter()
        .map(Case::build)
        .collect::<RemapResult<Vec<_>>>()?;
    info!("built {} catalog cases for size {}", cases.len(), config.size);
    Ok(cases)
}
