//! C code generation.
//!
//! Every case becomes a standalone program: the reference and the
//! transformed nest as two functions over the same array shape, a driver
//! that runs both on copies of one input, and the rounding helpers the
//! derived bounds use. Cells are `unsigned long long` so sums wrap the way
//! the Rust evaluation does; loop indices stay signed.

use crate::catalog::{Case, InputKind};
use crate::analysis::Observation;
use crate::ir::{Grid, LoopNestSpec};
use crate::utils::errors::{DomainError, RemapResult};
use crate::utils::pretty::CodeFormatter;

const HELPERS: &str = "\
static inline long long floord(long long n, long long d) { return n >= 0 ? n / d : -((-n + d - 1) / d); }
static inline long long ceild(long long n, long long d) { return -floord(-n, d); }
static inline long long pmod(long long a, long long m) { long long r = a % m; return r < 0 ? r + m : r; }
static inline long long max(long long a, long long b) { return a > b ? a : b; }
static inline long long min(long long a, long long b) { return a < b ? a : b; }
static inline cell cmax(cell a, cell b) { return (long long)a > (long long)b ? a : b; }
static inline cell cmin(cell a, cell b) { return (long long)a < (long long)b ? a : b; }
";

/// Original index names, `i`, `j`, then `i2`, `i3`, ...
fn index_names(dim: usize) -> Vec<String> {
    (0..dim)
        .map(|k| match k {
            0 => "i".to_string(),
            1 => "j".to_string(),
            k => format!("i{}", k),
        })
        .collect()
}

/// C code generator.
pub struct CCodeGen {
    /// Seed passed to `srand` for random inputs
    seed: u64,
    /// Random cells are drawn from `0..=max_value`
    max_value: i64,
}

impl CCodeGen {
    pub fn new(seed: u64, max_value: i64) -> Self {
        Self { seed, max_value }
    }

    /// Generate a C program for a case.
    pub fn generate(&self, case: &Case) -> RemapResult<String> {
        let shape = &case.array_shape;
        if shape.lower().iter().any(|&l| l != 0) {
            return Err(DomainError::out_of_bounds(shape.lower(), "a zero-based C array").into());
        }
        let mut f = CodeFormatter::new("    ");

        // Header
        f.writeln(&format!("/* {}: {} */", case.name, case.rule));
        f.writeln("#include <stdio.h>");
        f.writeln("#include <stdlib.h>");
        f.writeln("#include <string.h>");
        f.newline();
        f.writeln("typedef unsigned long long cell;");
        for (k, extent) in shape.upper().iter().enumerate() {
            f.writeln(&format!("#define N{} {}", k, extent));
        }
        f.newline();
        f.write(HELPERS);
        f.newline();

        if let Some(aux) = &case.aux {
            self.generate_table(&mut f, aux);
            f.newline();
        }

        self.generate_function(&mut f, "reference", case, &case.reference);
        f.newline();
        self.generate_function(&mut f, "transformed", case, &case.transformed);
        f.newline();
        self.generate_main(&mut f, case);

        Ok(f.finish())
    }

    fn array_type(&self, case: &Case) -> String {
        let tail: String = (1..case.array_shape.dim()).map(|k| format!("[N{}]", k)).collect();
        format!("cell (*a){}", tail)
    }

    fn array_decl(&self, name: &str, case: &Case) -> String {
        let dims: String = (0..case.array_shape.dim()).map(|k| format!("[N{}]", k)).collect();
        format!("{}{}", name, dims)
    }

    fn generate_table(&self, f: &mut CodeFormatter, aux: &Grid) {
        let shape = aux.shape();
        let width = if shape.dim() > 1 { shape.extent(shape.dim() - 1) as usize } else { aux.data().len() };
        let dims: String = (0..shape.dim()).map(|k| format!("[{}]", shape.extent(k))).collect();
        f.writeln(&format!("static const cell aux{} = {{", dims));
        f.indent();
        for row in aux.data().chunks(width.max(1)) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            f.writeln(&format!("{{{}}},", cells.join(", ")));
        }
        f.dedent();
        f.writeln("};");
    }

    fn generate_function(&self, f: &mut CodeFormatter, name: &str, case: &Case, nest: &LoopNestSpec) {
        f.writeln(&format!("static void {}({}) {{", name, self.array_type(case)));
        f.indent();

        // Generate loops outermost first
        let vars = nest.var_names();
        for (k, spec) in nest.loops.iter().enumerate() {
            let enclosing = &vars[..k];
            f.writeln(&format!(
                "for (long long {v} = {lo}; {v} <= {hi}; {v} += {step}) {{",
                v = spec.var,
                lo = spec.lower.render(enclosing),
                hi = spec.upper.render(enclosing),
                step = spec.step
            ));
            f.indent();
        }

        let names = index_names(nest.depth());
        for (name, formula) in names.iter().zip(nest.index_formulas()) {
            f.writeln(&format!("long long {} = {};", name, formula));
        }
        let target: String = names.iter().map(|n| format!("[{}]", n)).collect();
        let body = case.rule.expr.render_with("a", "aux", &names, ("cmax", "cmin"));
        f.writeln(&format!("a{} = {};", target, body));

        // Close loops
        for _ in 0..nest.depth() {
            f.dedent();
            f.writeln("}");
        }

        f.dedent();
        f.writeln("}");
    }

    fn generate_main(&self, f: &mut CodeFormatter, case: &Case) {
        f.writeln("int main(void) {");
        f.indent();
        f.writeln(&format!("static cell {};", self.array_decl("a", case)));
        f.writeln(&format!("static cell {};", self.array_decl("b", case)));
        f.writeln("cell *cells = (cell *)a;");
        f.writeln("size_t count = sizeof(a) / sizeof(cells[0]);");
        match case.input {
            InputKind::Random => {
                f.writeln(&format!("srand({});", self.seed));
                f.writeln("for (size_t k = 0; k < count; k++) {");
                f.indent();
                f.writeln(&format!("cells[k] = (cell)(rand() % {});", self.max_value + 1));
                f.dedent();
                f.writeln("}");
            }
            InputKind::Zeros => f.writeln("memset(a, 0, sizeof(a));"),
        }
        f.writeln("memcpy(b, a, sizeof(a));");
        f.writeln("reference(a);");
        f.writeln("transformed(b);");

        match &case.observation {
            Observation::Cell(point) => {
                let cell: String = point.iter().map(|v| format!("[{}]", v)).collect();
                f.writeln(&format!("int ok = a{c} == b{c};", c = cell));
                f.writeln(&format!("printf(\"%lld %lld\\n\", (long long)a{c}, (long long)b{c});", c = cell));
            }
            _ => f.writeln("int ok = memcmp(a, b, sizeof(a)) == 0;"),
        }
        f.writeln(&format!("printf(\"{}: %s\\n\", ok ? \"PASS\" : \"FAIL\");", case.name));
        f.writeln("return ok ? 0 : 1;");
        f.dedent();
        f.writeln("}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{catalog, CatalogConfig};

    fn case(name: &str) -> Case {
        catalog(&CatalogConfig::default())
            .unwrap()
            .into_iter()
            .find(|c| c.name == name)
            .unwrap()
    }

    #[test]
    fn test_wavefront_program() {
        let code = CCodeGen::new(0, 10).generate(&case("wavefront")).unwrap();
        assert!(code.contains("#define N0 100"));
        assert!(code.contains("typedef unsigned long long cell;"));
        assert!(code.contains("static void reference(cell (*a)[N1]) {"));
        assert!(code.contains("for (long long c0 = 2; c0 <= 198; c0 += 1) {"));
        assert!(code.contains("for (long long c1 = max(1, c0 - 99); c1 <= min(99, c0 - 1); c1 += 1) {"));
        assert!(code.contains("long long i = c0 - c1;"));
        assert!(code.contains("a[i][j] = a[i - 1][j] + a[i][j - 1];"));
        assert!(code.contains("int ok = memcmp(a, b, sizeof(a)) == 0;"));
    }

    #[test]
    fn test_general_program_uses_lattice_start() {
        let code = CCodeGen::new(0, 10).generate(&case("general")).unwrap();
        assert!(code.contains("pmod("));
        assert!(code.contains("c1 += 6"));
        assert!(code.contains("long long i = (4*c0 - 2*c1) / 6;"));
    }

    #[test]
    fn test_lcs_program() {
        let code = CCodeGen::new(0, 10).generate(&case("lcs")).unwrap();
        assert!(code.contains("static const cell aux[19][16] = {"));
        assert!(code.contains("a[i][j] = cmax(cmax(a[i - 1][j], a[i][j - 1]), a[i - 1][j - 1] + aux[i][j]);"));
        assert!(code.contains("memset(a, 0, sizeof(a));"));
        assert!(code.contains("int ok = a[18][15] == b[18][15];"));
    }
}
