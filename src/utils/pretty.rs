//! Text formatting helpers for rendered loop nests.

/// A simple code formatter for generated code.
#[derive(Debug)]
pub struct CodeFormatter {
    output: String,
    indent_level: usize,
    indent_str: String,
    at_line_start: bool,
}

impl CodeFormatter {
    /// Create a new formatter with the given indent string.
    pub fn new(indent_str: &str) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_str: indent_str.to_string(),
            at_line_start: true,
        }
    }

    /// Create a formatter with default settings (2 spaces).
    pub fn default_indent() -> Self {
        Self::new("  ")
    }

    /// Increase indentation level.
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indentation level.
    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write text.
    pub fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.output.push('\n');
                self.at_line_start = true;
            } else {
                if self.at_line_start {
                    for _ in 0..self.indent_level {
                        self.output.push_str(&self.indent_str);
                    }
                    self.at_line_start = false;
                }
                self.output.push(c);
            }
        }
    }

    /// Write a line.
    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    /// Write an empty line.
    pub fn newline(&mut self) {
        self.write("\n");
    }

    /// Get the formatted output.
    pub fn finish(self) -> String {
        self.output
    }
}

/// Render `sum(coeffs[k] * names[k]) + constant` without redundant terms.
pub fn format_linear(coeffs: &[i64], names: &[String], constant: i64) -> String {
    let mut out = String::new();
    for (c, name) in coeffs.iter().zip(names) {
        if *c == 0 {
            continue;
        }
        let sign = if *c < 0 { "-" } else { "+" };
        let magnitude = c.abs();
        if out.is_empty() {
            if *c < 0 {
                out.push('-');
            }
        } else {
            out.push_str(&format!(" {} ", sign));
        }
        if magnitude != 1 {
            out.push_str(&format!("{}*", magnitude));
        }
        out.push_str(name);
    }
    if out.is_empty() {
        return constant.to_string();
    }
    match constant {
        0 => {}
        k if k < 0 => out.push_str(&format!(" - {}", -k)),
        k => out.push_str(&format!(" + {}", k)),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_formatter() {
        let mut fmt = CodeFormatter::default_indent();
        fmt.writeln("int main() {");
        fmt.indent();
        fmt.writeln("return 0;");
        fmt.dedent();
        fmt.writeln("}");

        let output = fmt.finish();
        assert!(output.contains("  return"));
    }

    #[test]
    fn test_format_linear() {
        let names = vec!["i".to_string(), "j".to_string()];
        assert_eq!(format_linear(&[1, -1], &names, 0), "i - j");
        assert_eq!(format_linear(&[0, 3], &names, -99), "3*j - 99");
        assert_eq!(format_linear(&[-4, 0], &names, 2), "-4*i + 2");
        assert_eq!(format_linear(&[0, 0], &names, 7), "7");
    }
}
