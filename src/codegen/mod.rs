//! Rendering of catalog cases.

pub mod c;

pub use c::CCodeGen;

use crate::catalog::Case;
use crate::utils::errors::RemapResult;
use crate::utils::pretty::CodeFormatter;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Human-readable description of both nests
    Summary,
    /// Standalone C program
    C,
}

/// Render a case for a target.
pub fn generate(case: &Case, target: Target) -> RemapResult<String> {
    match target {
        Target::Summary => Ok(summary(case)),
        Target::C => emit_c(case),
    }
}

/// Standalone C program running both nests of a case and comparing them.
pub fn emit_c(case: &Case) -> RemapResult<String> {
    CCodeGen::new(0, 10).generate(case)
}

/// Domain, transform, dependences and both nests of a case.
pub fn summary(case: &Case) -> String {
    let t = &case.transformed.transform;
    let mut f = CodeFormatter::default_indent();
    f.writeln(&format!("== {} ==", case.name));
    f.indent();
    f.writeln(&format!("domain:      {}", case.transformed.domain));
    f.writeln(&format!("transform:   {} ({}, det {})", t, t.classify(), t.determinant()));
    f.writeln(&format!("dependences: {}", case.dependences));
    f.writeln(&format!("rule:        {}", case.rule));
    f.writeln("reference:");
    f.indent();
    f.write(&case.reference.to_string());
    f.dedent();
    f.writeln("transformed:");
    f.indent();
    f.write(&case.transformed.to_string());
    f.dedent();
    f.dedent();
    f.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{catalog, CatalogConfig};

    #[test]
    fn test_summary_mentions_lattice() {
        let cases = catalog(&CatalogConfig::default()).unwrap();
        let general = cases.iter().find(|c| c.name == "general").unwrap();
        let text = generate(general, Target::Summary).unwrap();
        assert!(text.contains("== general =="));
        assert!(text.contains("(lattice, det 6)"));
        assert!(text.contains("step 6"));
    }
}
