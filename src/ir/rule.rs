//! Per-point update rules.
//!
//! A rule computes the new value of the cell at the current iteration point
//! from cells at fixed offsets around it. Arithmetic wraps on overflow, so
//! long sweeps over large grids stay deterministic.

use crate::ir::grid::Grid;
use crate::polyhedral::{AffineAccess, DependencePattern};
use crate::utils::errors::{DomainError, RemapResult};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Expression tree evaluated at one iteration point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellExpr {
    /// The main grid at `point + offset`
    Read(Vec<i64>),
    /// The read-only auxiliary grid at `point + offset`
    Aux(Vec<i64>),
    /// A literal
    Const(i64),
    /// Wrapping sum
    Add(Box<CellExpr>, Box<CellExpr>),
    /// Wrapping difference
    Sub(Box<CellExpr>, Box<CellExpr>),
    /// Larger operand
    Max(Box<CellExpr>, Box<CellExpr>),
    /// Smaller operand
    Min(Box<CellExpr>, Box<CellExpr>),
}

impl CellExpr {
    /// Read the main grid at `point + offset`.
    pub fn read(offset: &[i64]) -> Self {
        CellExpr::Read(offset.to_vec())
    }

    /// Read the auxiliary grid at `point + offset`.
    pub fn aux(offset: &[i64]) -> Self {
        CellExpr::Aux(offset.to_vec())
    }

    /// `lhs + rhs`
    pub fn add(lhs: CellExpr, rhs: CellExpr) -> Self {
        CellExpr::Add(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs - rhs`
    pub fn sub(lhs: CellExpr, rhs: CellExpr) -> Self {
        CellExpr::Sub(Box::new(lhs), Box::new(rhs))
    }

    /// `max(lhs, rhs)`
    pub fn max(lhs: CellExpr, rhs: CellExpr) -> Self {
        CellExpr::Max(Box::new(lhs), Box::new(rhs))
    }

    /// `min(lhs, rhs)`
    pub fn min(lhs: CellExpr, rhs: CellExpr) -> Self {
        CellExpr::Min(Box::new(lhs), Box::new(rhs))
    }

    /// Evaluate at `point`.
    pub fn eval(&self, grid: &Grid, aux: Option<&Grid>, point: &[i64]) -> RemapResult<i64> {
        Ok(match self {
            CellExpr::Read(offset) => grid.get(&shift(point, offset))?,
            CellExpr::Aux(offset) => {
                let shifted = shift(point, offset);
                match aux {
                    Some(aux) => aux.get(&shifted)?,
                    None => return Err(DomainError::out_of_bounds(&shifted, "missing auxiliary grid").into()),
                }
            }
            CellExpr::Const(v) => *v,
            CellExpr::Add(a, b) => a.eval(grid, aux, point)?.wrapping_add(b.eval(grid, aux, point)?),
            CellExpr::Sub(a, b) => a.eval(grid, aux, point)?.wrapping_sub(b.eval(grid, aux, point)?),
            CellExpr::Max(a, b) => a.eval(grid, aux, point)?.max(b.eval(grid, aux, point)?),
            CellExpr::Min(a, b) => a.eval(grid, aux, point)?.min(b.eval(grid, aux, point)?),
        })
    }

    fn collect_reads<'a>(&'a self, out: &mut Vec<&'a [i64]>) {
        match self {
            CellExpr::Read(offset) => out.push(offset),
            CellExpr::Aux(_) | CellExpr::Const(_) => {}
            CellExpr::Add(a, b) | CellExpr::Sub(a, b) | CellExpr::Max(a, b) | CellExpr::Min(a, b) => {
                a.collect_reads(out);
                b.collect_reads(out);
            }
        }
    }

    /// Render as a C expression over the original index names.
    pub fn render(&self, array: &str, aux: &str, names: &[String]) -> String {
        self.render_with(array, aux, names, ("max", "min"))
    }

    /// Like `render`, calling `ops.0` and `ops.1` for max and min.
    pub fn render_with(&self, array: &str, aux: &str, names: &[String], ops: (&str, &str)) -> String {
        let r = |e: &CellExpr| e.render_with(array, aux, names, ops);
        match self {
            CellExpr::Read(offset) => format!("{}{}", array, subscript(names, offset)),
            CellExpr::Aux(offset) => format!("{}{}", aux, subscript(names, offset)),
            CellExpr::Const(v) => v.to_string(),
            CellExpr::Add(a, b) => format!("{} + {}", r(&**a), r(&**b)),
            CellExpr::Sub(a, b) => format!("{} - ({})", r(&**a), r(&**b)),
            CellExpr::Max(a, b) => format!("{}({}, {})", ops.0, r(&**a), r(&**b)),
            CellExpr::Min(a, b) => format!("{}({}, {})", ops.1, r(&**a), r(&**b)),
        }
    }
}

fn shift(point: &[i64], offset: &[i64]) -> Vec<i64> {
    point.iter().zip(offset).map(|(p, o)| p + o).collect()
}

fn subscript(names: &[String], offset: &[i64]) -> String {
    names
        .iter()
        .zip(offset)
        .map(|(name, &o)| match o {
            0 => format!("[{}]", name),
            o if o > 0 => format!("[{} + {}]", name, o),
            o => format!("[{} - {}]", name, -o),
        })
        .collect()
}

impl fmt::Display for CellExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = ["i", "j", "k", "l"].iter().map(|s| s.to_string()).collect();
        write!(f, "{}", self.render("a", "aux", &names))
    }
}

/// A named assignment `a[p] = expr` executed at every iteration point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRule {
    /// Rule name, used in reports and generated code
    pub name: String,
    /// Right-hand side
    pub expr: CellExpr,
}

impl UpdateRule {
    /// Create a rule.
    pub fn new(name: impl Into<String>, expr: CellExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }

    /// `a[p] = sum of a[p + offset]` over `offsets`.
    pub fn stencil(name: impl Into<String>, offsets: &[&[i64]]) -> Self {
        let expr = offsets
            .iter()
            .map(|o| CellExpr::read(o))
            .reduce(CellExpr::add)
            .unwrap_or(CellExpr::Const(0));
        Self::new(name, expr)
    }

    /// Longest common subsequence recurrence over a match grid:
    /// `a[i][j] = max(a[i-1][j], a[i][j-1], a[i-1][j-1] + match[i][j])`.
    pub fn lcs() -> Self {
        let expr = CellExpr::max(
            CellExpr::max(CellExpr::read(&[-1, 0]), CellExpr::read(&[0, -1])),
            CellExpr::add(CellExpr::read(&[-1, -1]), CellExpr::aux(&[0, 0])),
        );
        Self::new("lcs", expr)
    }

    /// Offsets read from the main grid, in expression order.
    pub fn reads(&self) -> Vec<Vec<i64>> {
        let mut out = Vec::new();
        self.expr.collect_reads(&mut out);
        out.into_iter().map(<[i64]>::to_vec).collect()
    }

    /// Dependences carried by the rule on a `dim`-dimensional nest.
    pub fn dependence_pattern(&self, dim: usize) -> RemapResult<DependencePattern> {
        let write = AffineAccess::uniform(vec![0; dim]);
        let reads: Vec<AffineAccess> = self.reads().into_iter().map(AffineAccess::uniform).collect();
        DependencePattern::from_accesses(&write, &reads)
    }

    /// Execute the rule at `point`.
    pub fn apply(&self, grid: &mut Grid, aux: Option<&Grid>, point: &[i64]) -> RemapResult<()> {
        let value = self.expr.eval(grid, aux, point)?;
        grid.set(point, value)?;
        Ok(())
    }
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: a[i][j] = {}", self.name, self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::IterationDomain;

    fn grid() -> Grid {
        Grid::from_fn(IterationDomain::square(2, 3).unwrap(), |p| p[0] * 3 + p[1])
    }

    #[test]
    fn test_stencil_apply() {
        let rule = UpdateRule::stencil("sum", &[&[-1, 0], &[0, -1]]);
        let mut g = grid();
        rule.apply(&mut g, None, &[1, 1]).unwrap();
        // a[0][1] + a[1][0] = 1 + 3
        assert_eq!(g.get(&[1, 1]).unwrap(), 4);
    }

    #[test]
    fn test_out_of_bounds_read() {
        let rule = UpdateRule::stencil("sum", &[&[-1, 0]]);
        let mut g = grid();
        assert!(rule.apply(&mut g, None, &[0, 0]).is_err());
    }

    #[test]
    fn test_wrapping_add() {
        let shape = IterationDomain::square(1, 2).unwrap();
        let mut g = Grid::from_fn(shape, |_| i64::MAX);
        let rule = UpdateRule::new("wrap", CellExpr::add(CellExpr::read(&[-1]), CellExpr::Const(1)));
        rule.apply(&mut g, None, &[1]).unwrap();
        assert_eq!(g.get(&[1]).unwrap(), i64::MIN);
    }

    #[test]
    fn test_lcs_rule() {
        let shape = IterationDomain::square(2, 2).unwrap();
        let mut g = Grid::zeros(shape.clone());
        let matches = Grid::from_fn(shape, |_| 1);
        UpdateRule::lcs().apply(&mut g, Some(&matches), &[1, 1]).unwrap();
        assert_eq!(g.get(&[1, 1]).unwrap(), 1);
        assert!(UpdateRule::lcs().apply(&mut g, None, &[1, 1]).is_err());
    }

    #[test]
    fn test_reads_and_pattern() {
        let rule = UpdateRule::stencil("skew", &[&[-1, 0], &[0, -1], &[1, -1]]);
        assert_eq!(rule.reads(), vec![vec![-1, 0], vec![0, -1], vec![1, -1]]);
        let pattern = rule.dependence_pattern(2).unwrap();
        assert_eq!(pattern.offsets(), &[vec![-1, 0], vec![0, -1], vec![-1, 1]]);

        let lcs = UpdateRule::lcs().dependence_pattern(2).unwrap();
        assert_eq!(lcs.offsets(), &[vec![-1, 0], vec![0, -1], vec![-1, -1]]);
    }

    #[test]
    fn test_render() {
        let names = vec!["x".to_string(), "y".to_string()];
        let rule = UpdateRule::stencil("skew", &[&[-1, 0], &[1, -1]]);
        assert_eq!(rule.expr.render("a", "m", &names), "a[x - 1][y] + a[x + 1][y - 1]");
        assert_eq!(
            UpdateRule::lcs().expr.render("a", "m", &names),
            "max(max(a[x - 1][y], a[x][y - 1]), a[x - 1][y - 1] + m[x][y])"
        );
        assert_eq!(
            UpdateRule::lcs().expr.render_with("a", "m", &names, ("cmax", "cmin")),
            "cmax(cmax(a[x - 1][y], a[x][y - 1]), a[x - 1][y - 1] + m[x][y])"
        );
    }
}
