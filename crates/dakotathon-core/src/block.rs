//! Text builder for Dakota input blocks.
//!
//! Dakota input is keyword based: a block name at column zero, keywords
//! indented beneath it, `keyword = value` pairs, strings in quotes and lists
//! as space-separated values. Every block is terminated by a blank line.

use std::fmt::Display;

/// First line of every generated input file.
pub const HEADER: &str = "# Dakota input file\n";

const INDENT: &str = "  ";

/// Format a real in shortest round-trip form, always keeping a decimal
/// point or exponent (`1.0`, `0.25`, `1e-7`).
pub fn real(x: f64) -> String {
    format!("{x:?}")
}

/// Quote a string for Dakota. Single quotes unless the value contains one.
pub fn quote(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{s}\"")
    } else {
        format!("'{s}'")
    }
}

pub struct Block {
    text: String,
}

impl Block {
    pub fn new(name: &str) -> Self {
        Self {
            text: format!("{name}\n"),
        }
    }

    /// Bare keyword at the given nesting depth (1 = directly under the block).
    pub fn keyword(&mut self, depth: usize, keyword: &str) -> &mut Self {
        self.push_line(depth, keyword);
        self
    }

    pub fn value(&mut self, depth: usize, keyword: &str, value: impl Display) -> &mut Self {
        self.push_line(depth, &format!("{keyword} = {value}"));
        self
    }

    pub fn string(&mut self, depth: usize, keyword: &str, value: &str) -> &mut Self {
        self.value(depth, keyword, quote(value))
    }

    /// `keyword = 'a' 'b'`. Skipped entirely when `values` is empty.
    pub fn strings(&mut self, depth: usize, keyword: &str, values: &[String]) -> &mut Self {
        let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
        self.list(depth, keyword, &quoted)
    }

    /// `keyword = 1.0 2.5`. Skipped entirely when `values` is empty.
    pub fn reals(&mut self, depth: usize, keyword: &str, values: &[f64]) -> &mut Self {
        let formatted: Vec<String> = values.iter().map(|&v| real(v)).collect();
        self.list(depth, keyword, &formatted)
    }

    /// `keyword = 5 4`. Skipped entirely when `values` is empty.
    pub fn integers(&mut self, depth: usize, keyword: &str, values: &[u32]) -> &mut Self {
        let formatted: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.list(depth, keyword, &formatted)
    }

    pub fn finish(mut self) -> String {
        self.text.push('\n');
        self.text
    }

    fn list(&mut self, depth: usize, keyword: &str, items: &[String]) -> &mut Self {
        if !items.is_empty() {
            self.push_line(depth, &format!("{keyword} = {}", items.join(" ")));
        }
        self
    }

    fn push_line(&mut self, depth: usize, line: &str) {
        for _ in 0..depth {
            self.text.push_str(INDENT);
        }
        self.text.push_str(line);
        self.text.push('\n');
    }
}
