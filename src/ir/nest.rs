//! Loop nests with symbolic bounds.
//!
//! A `LoopNestSpec` is the output of bound derivation: one loop per axis,
//! each bound an expression in the enclosing loop variables, plus the map
//! from a visited point back to the original iteration.
//!
//! ```text
//! for c0 = 2 to 198
//!   for c1 = max(1, c0 - 99) to min(99, c0 - 1)
//!     S(c0 - c1, c1)
//! ```

use crate::ir::grid::Grid;
use crate::ir::rule::UpdateRule;
use crate::polyhedral::{InverseMap, IterationDomain, TransformMatrix};
use crate::utils::errors::RemapResult;
use crate::utils::matrix::{ceil_div, floor_div, mod_floor};
use crate::utils::pretty::{format_linear, CodeFormatter};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Rounding of an affine bound with a divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rounding {
    /// Round toward negative infinity
    Floor,
    /// Round toward positive infinity
    Ceil,
}

/// `round((coeffs . outer + constant) / divisor)` with `divisor > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffineBound {
    /// One coefficient per enclosing loop variable
    pub coeffs: Vec<i64>,
    /// Constant term
    pub constant: i64,
    /// Positive divisor
    pub divisor: i64,
    /// Rounding applied to the quotient
    pub rounding: Rounding,
}

impl AffineBound {
    /// `coeffs . outer + constant`, no division.
    pub fn linear(coeffs: Vec<i64>, constant: i64) -> Self {
        Self {
            coeffs,
            constant,
            divisor: 1,
            rounding: Rounding::Floor,
        }
    }

    /// `floor((coeffs . outer + constant) / divisor)`.
    pub fn floor(coeffs: Vec<i64>, constant: i64, divisor: i64) -> Self {
        Self {
            coeffs,
            constant,
            divisor,
            rounding: Rounding::Floor,
        }
    }

    /// `ceil((coeffs . outer + constant) / divisor)`.
    pub fn ceil(coeffs: Vec<i64>, constant: i64, divisor: i64) -> Self {
        Self {
            coeffs,
            constant,
            divisor,
            rounding: Rounding::Ceil,
        }
    }

    /// Evaluate for the given values of the enclosing variables.
    pub fn eval(&self, outer: &[i64]) -> i64 {
        let numerator: i64 = self
            .coeffs
            .iter()
            .zip(outer)
            .map(|(c, v)| c * v)
            .sum::<i64>()
            + self.constant;
        match self.rounding {
            Rounding::Floor => floor_div(numerator, self.divisor),
            Rounding::Ceil => ceil_div(numerator, self.divisor),
        }
    }

    /// Render with `floord`/`ceild` where a division remains.
    pub fn render(&self, names: &[String]) -> String {
        let numerator = format_linear(&self.coeffs, names, self.constant);
        if self.divisor == 1 {
            return numerator;
        }
        let func = match self.rounding {
            Rounding::Floor => "floord",
            Rounding::Ceil => "ceild",
        };
        format!("{}({}, {})", func, numerator, self.divisor)
    }
}

/// A loop bound in terms of enclosing loop variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    /// A constant
    Const(i64),
    /// An affine form, possibly divided and rounded
    Affine(AffineBound),
    /// Largest of the operands
    Max(Vec<Bound>),
    /// Smallest of the operands
    Min(Vec<Bound>),
    /// Smallest value `>= base` congruent to `residue` modulo `modulus`
    Aligned {
        /// Unaligned start
        base: Box<Bound>,
        /// Target residue
        residue: AffineBound,
        /// Step of the loop
        modulus: i64,
    },
}

impl Bound {
    /// `max` of several bounds, collapsing the single-operand case.
    pub fn max_of(mut bounds: Vec<Bound>) -> Bound {
        if bounds.len() == 1 {
            bounds.remove(0)
        } else {
            Bound::Max(bounds)
        }
    }

    /// `min` of several bounds, collapsing the single-operand case.
    pub fn min_of(mut bounds: Vec<Bound>) -> Bound {
        if bounds.len() == 1 {
            bounds.remove(0)
        } else {
            Bound::Min(bounds)
        }
    }

    /// Evaluate for the given values of the enclosing variables.
    pub fn eval(&self, outer: &[i64]) -> i64 {
        match self {
            Bound::Const(v) => *v,
            Bound::Affine(a) => a.eval(outer),
            Bound::Max(bs) => bs.iter().map(|b| b.eval(outer)).max().unwrap_or(i64::MIN),
            Bound::Min(bs) => bs.iter().map(|b| b.eval(outer)).min().unwrap_or(i64::MAX),
            Bound::Aligned { base, residue, modulus } => {
                let start = base.eval(outer);
                start + mod_floor(residue.eval(outer) - start, *modulus)
            }
        }
    }

    /// Render as a C expression.
    pub fn render(&self, names: &[String]) -> String {
        match self {
            Bound::Const(v) => v.to_string(),
            Bound::Affine(a) => a.render(names),
            Bound::Max(bs) => nest_binary("max", bs, names),
            Bound::Min(bs) => nest_binary("min", bs, names),
            Bound::Aligned { base, residue, modulus } => {
                let start = base.render(names);
                format!("{} + pmod({} - ({}), {})", start, residue.render(names), start, modulus)
            }
        }
    }
}

fn nest_binary(func: &str, operands: &[Bound], names: &[String]) -> String {
    match operands.split_first() {
        None => String::new(),
        Some((first, [])) => first.render(names),
        Some((first, rest)) => format!("{}({}, {})", func, first.render(names), nest_binary(func, rest, names)),
    }
}

/// One loop of a nest; `upper` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSpec {
    /// Loop variable name
    pub var: String,
    /// First value
    pub lower: Bound,
    /// Last value (inclusive)
    pub upper: Bound,
    /// Positive stride
    pub step: i64,
}

impl LoopSpec {
    /// A loop over `lower..=upper` with stride `step`.
    pub fn new(var: impl Into<String>, lower: Bound, upper: Bound, step: i64) -> Self {
        Self {
            var: var.into(),
            lower,
            upper,
            step,
        }
    }
}

/// A loop nest visiting a transformed domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopNestSpec {
    /// Original iteration domain
    pub domain: IterationDomain,
    /// Transform the loops enumerate the image of
    pub transform: TransformMatrix,
    /// Loops, outermost first
    pub loops: Vec<LoopSpec>,
    /// Map from loop variables back to original indices
    pub inverse: InverseMap,
    /// Statement executed at every point
    pub body: Option<UpdateRule>,
}

impl LoopNestSpec {
    /// The identity nest visiting `domain` in lexicographic order.
    pub fn reference(domain: &IterationDomain) -> Self {
        let loops = (0..domain.dim())
            .map(|k| {
                LoopSpec::new(
                    transformed_var(k),
                    Bound::Const(domain.lower()[k]),
                    Bound::Const(domain.upper()[k] - 1),
                    1,
                )
            })
            .collect();
        Self {
            domain: domain.clone(),
            transform: TransformMatrix::identity(domain.dim()),
            loops,
            inverse: InverseMap::identity(domain.dim()),
            body: None,
        }
    }

    /// Attach a statement.
    pub fn with_body(mut self, body: UpdateRule) -> Self {
        self.body = Some(body);
        self
    }

    /// Number of loops.
    pub fn depth(&self) -> usize {
        self.loops.len()
    }

    /// Loop variable names, outermost first.
    pub fn var_names(&self) -> Vec<String> {
        self.loops.iter().map(|l| l.var.clone()).collect()
    }

    /// Visit every point of the nest in loop order, in loop coordinates.
    pub fn walk<F>(&self, f: &mut F) -> RemapResult<()>
    where
        F: FnMut(&[i64]) -> RemapResult<()>,
    {
        let mut point = Vec::with_capacity(self.depth());
        self.walk_level(0, &mut point, f)
    }

    fn walk_level<F>(&self, level: usize, point: &mut Vec<i64>, f: &mut F) -> RemapResult<()>
    where
        F: FnMut(&[i64]) -> RemapResult<()>,
    {
        if level == self.loops.len() {
            return f(point.as_slice());
        }
        let spec = &self.loops[level];
        let hi = spec.upper.eval(point);
        let mut v = spec.lower.eval(point);
        while v <= hi {
            point.push(v);
            self.walk_level(level + 1, point, f)?;
            point.pop();
            v += spec.step;
        }
        Ok(())
    }

    /// Visit every point in loop order, mapped back to original indices.
    pub fn visit<F>(&self, mut f: F) -> RemapResult<()>
    where
        F: FnMut(&[i64]) -> RemapResult<()>,
    {
        self.walk(&mut |q: &[i64]| {
            let original = self.inverse.apply(q)?;
            f(&original)
        })
    }

    /// Points in loop coordinates, in visiting order.
    pub fn transformed_points(&self) -> RemapResult<Vec<Vec<i64>>> {
        let mut out = Vec::new();
        self.walk(&mut |q: &[i64]| {
            out.push(q.to_vec());
            Ok(())
        })?;
        Ok(out)
    }

    /// Original iterations, in visiting order.
    pub fn iteration_points(&self) -> RemapResult<Vec<Vec<i64>>> {
        let mut out = Vec::new();
        self.visit(|p: &[i64]| {
            out.push(p.to_vec());
            Ok(())
        })?;
        Ok(out)
    }

    /// Execute the body at every point. A nest without a body only walks.
    pub fn run(&self, grid: &mut Grid, aux: Option<&Grid>) -> RemapResult<()> {
        match &self.body {
            Some(rule) => self.visit(|p: &[i64]| rule.apply(grid, aux, p)),
            None => self.visit(|_: &[i64]| Ok(())),
        }
    }

    /// Original index expressions in terms of the loop variables.
    pub fn index_formulas(&self) -> Vec<String> {
        self.inverse.formulas(&self.var_names())
    }
}

/// Loop variable name for axis `k` of a nest.
pub fn transformed_var(k: usize) -> String {
    format!("c{}", k)
}

impl fmt::Display for LoopNestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = CodeFormatter::default_indent();
        let names = self.var_names();
        for (k, spec) in self.loops.iter().enumerate() {
            let enclosing = &names[..k];
            let mut line = format!(
                "for {} = {} to {}",
                spec.var,
                spec.lower.render(enclosing),
                spec.upper.render(enclosing)
            );
            if spec.step != 1 {
                line.push_str(&format!(" step {}", spec.step));
            }
            out.writeln(&line);
            out.indent();
        }
        let stmt = self.body.as_ref().map_or("S", |b| b.name.as_str());
        out.writeln(&format!("{}({})", stmt, self.index_formulas().join(", ")));
        write!(f, "{}", out.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["c0".to_string(), "c1".to_string()]
    }

    #[test]
    fn test_affine_rounding() {
        assert_eq!(AffineBound::floor(vec![1], -1, 2).eval(&[0]), -1);
        assert_eq!(AffineBound::ceil(vec![1], -1, 2).eval(&[0]), 0);
        assert_eq!(AffineBound::ceil(vec![3], 0, 2).eval(&[3]), 5);
        assert_eq!(AffineBound::floor(vec![3], 0, 2).eval(&[3]), 4);
    }

    #[test]
    fn test_max_min() {
        let lo = Bound::max_of(vec![Bound::Const(1), Bound::Affine(AffineBound::linear(vec![1], -99))]);
        let hi = Bound::min_of(vec![Bound::Const(99), Bound::Affine(AffineBound::linear(vec![1], -1))]);
        assert_eq!(lo.eval(&[2]), 1);
        assert_eq!(hi.eval(&[2]), 1);
        assert_eq!(lo.eval(&[150]), 51);
        assert_eq!(hi.eval(&[150]), 99);
        assert_eq!(lo.render(&names()), "max(1, c0 - 99)");
        assert_eq!(Bound::max_of(vec![Bound::Const(3)]), Bound::Const(3));
    }

    #[test]
    fn test_aligned() {
        // first value >= 10 congruent to 5 * c0 (mod 6), at c0 = 4 -> residue 2
        let b = Bound::Aligned {
            base: Box::new(Bound::Const(10)),
            residue: AffineBound::linear(vec![5], 0),
            modulus: 6,
        };
        assert_eq!(b.eval(&[4]), 14);
        assert_eq!(b.render(&names()), "10 + pmod(5*c0 - (10), 6)");
    }

    #[test]
    fn test_reference_nest() {
        let domain = IterationDomain::rect(0, 2, 3, 5).unwrap();
        let nest = LoopNestSpec::reference(&domain);
        let points = nest.iteration_points().unwrap();
        assert_eq!(points, domain.points().collect::<Vec<_>>());
        assert_eq!(nest.to_string(), "for c0 = 0 to 1\n  for c1 = 3 to 4\n    S(c0, c1)\n");
    }

    #[test]
    fn test_step_and_dependent_bounds() {
        let nest = LoopNestSpec {
            domain: IterationDomain::square(2, 3).unwrap(),
            transform: TransformMatrix::identity(2),
            loops: vec![
                LoopSpec::new("c0", Bound::Const(0), Bound::Const(2), 2),
                LoopSpec::new("c1", Bound::Const(0), Bound::Affine(AffineBound::linear(vec![1], 0)), 1),
            ],
            inverse: InverseMap::identity(2),
            body: None,
        };
        let points = nest.transformed_points().unwrap();
        assert_eq!(points, vec![vec![0, 0], vec![2, 0], vec![2, 1], vec![2, 2]]);
    }

    #[test]
    fn test_run_body() {
        let domain = IterationDomain::rect(1, 3, 1, 3).unwrap();
        let rule = UpdateRule::stencil("sum", &[&[-1, 0], &[0, -1]]);
        let nest = LoopNestSpec::reference(&domain).with_body(rule);
        let mut grid = Grid::from_fn(IterationDomain::square(2, 3).unwrap(), |_| 1);
        nest.run(&mut grid, None).unwrap();
        assert_eq!(grid.get(&[1, 1]).unwrap(), 2);
        assert_eq!(grid.get(&[1, 2]).unwrap(), 3);
        assert_eq!(grid.get(&[2, 2]).unwrap(), 6);
    }
}
