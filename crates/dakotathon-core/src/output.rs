//! Parsers for what Dakota writes back: the tabular data file (one row per
//! evaluation) and the human-readable output file.
//!
//! Only the sections dakotathon reports on are read from the output file:
//! moment statistics, Sobol' indices and the evaluation summary. Everything
//! else is skipped.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

static EVAL_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Function evaluation summary(?: \([^)]*\))?: (\d+) total").unwrap()
});

/// Contents of `dakota.dat`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TabularData {
    pub eval_ids: Vec<u64>,
    /// Interface id per row, when the file has an `interface` column.
    pub interfaces: Vec<String>,
    /// Names of the numeric columns: variables, then responses.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TabularData {
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (header_line, header) = lines
            .next()
            .ok_or_else(|| Error::parse(1, "tabular data file is empty"))?;
        let header = header
            .strip_prefix('%')
            .ok_or_else(|| Error::parse(header_line, "expected a '%eval_id' header"))?;
        let names: Vec<&str> = header.split_whitespace().collect();
        if names.first() != Some(&"eval_id") {
            return Err(Error::parse(header_line, "expected a '%eval_id' header"));
        }
        let has_interface = names.get(1) == Some(&"interface");
        let skip = if has_interface { 2 } else { 1 };

        let mut data = TabularData {
            columns: names[skip..].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };

        for (line, row) in lines {
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() != names.len() {
                return Err(Error::parse(
                    line,
                    format!("expected {} columns, found {}", names.len(), fields.len()),
                ));
            }
            let eval_id = fields[0]
                .parse()
                .map_err(|_| Error::parse(line, format!("bad eval_id '{}'", fields[0])))?;
            data.eval_ids.push(eval_id);
            if has_interface {
                data.interfaces.push(fields[1].to_string());
            }
            let values = fields[skip..]
                .iter()
                .map(|f| {
                    f.parse::<f64>()
                        .map_err(|_| Error::parse(line, format!("'{f}' is not a number")))
                })
                .collect::<Result<Vec<f64>>>()?;
            data.rows.push(values);
        }

        Ok(data)
    }

    /// All values of one column, in evaluation order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseMoments {
    pub descriptor: String,
    pub mean: f64,
    pub std_dev: f64,
    /// Missing when Dakota prints only mean and standard deviation.
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

impl ResponseMoments {
    fn from_row(descriptor: String, v: &[f64]) -> Self {
        Self {
            descriptor,
            mean: v[0],
            std_dev: v[1],
            skewness: v.get(2).copied(),
            kurtosis: v.get(3).copied(),
        }
    }

    fn fill_missing(&mut self, v: &[f64]) {
        self.skewness = self.skewness.or(v.get(2).copied());
        self.kurtosis = self.kurtosis.or(v.get(3).copied());
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SobolIndex {
    pub response: String,
    pub variable: String,
    pub main: f64,
    pub total: f64,
}

/// Results read from `dakota.out`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DakotaOutput {
    pub moments: Vec<ResponseMoments>,
    pub sobol: Vec<SobolIndex>,
    /// Total function evaluations reported by the last summary line.
    pub evaluations: Option<usize>,
    /// True once Dakota reports an iterator completed.
    pub completed: bool,
}

impl DakotaOutput {
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut out = DakotaOutput::default();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].trim();
            if line.starts_with("Sample moment statistics")
                || line.starts_with("Moment-based statistics")
            {
                i = read_moments(&lines, i + 1, &mut out.moments);
                continue;
            }
            if let Some(response) = line.strip_suffix("Sobol' indices:") {
                i = read_sobol(&lines, i + 1, response.trim(), &mut out.sobol);
                continue;
            }
            if let Some(caps) = EVAL_SUMMARY.captures(line) {
                out.evaluations = caps[1].parse().ok();
            }
            if line.starts_with("<<<<< Iterator") && line.ends_with("completed.") {
                out.completed = true;
            }
            i += 1;
        }

        out
    }

    pub fn moments_for(&self, descriptor: &str) -> Option<&ResponseMoments> {
        self.moments.iter().find(|m| m.descriptor == descriptor)
    }
}

fn numbers(fields: &[&str]) -> Option<Vec<f64>> {
    fields.iter().map(|f| f.parse().ok()).collect()
}

/// Read a moments table starting at `start`; returns the index after it.
///
/// Rows are either `label mean std skew kurt` (sampling) or a bare label
/// followed by `expansion:` and `integration:`/`numerical:` rows
/// (stochastic expansions). The expansion row usually carries only mean
/// and standard deviation; higher moments come from the row after it.
fn read_moments(lines: &[&str], start: usize, moments: &mut Vec<ResponseMoments>) -> usize {
    let mut i = start;
    let mut current: Option<String> = None;

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();

        if line.contains("Mean") && line.contains("Std Dev") {
            // column header
        } else if fields.len() == 1 {
            current = Some(fields[0].to_string());
        } else if let Some(v) = numbers(&fields[1..]).filter(|v| (2..=4).contains(&v.len())) {
            let label = fields[0].trim_end_matches(':');
            match (label, current.as_deref()) {
                ("expansion", Some(descriptor)) => {
                    moments.push(ResponseMoments::from_row(descriptor.to_string(), &v));
                }
                ("integration" | "numerical", Some(descriptor)) => {
                    match moments.last_mut().filter(|m| m.descriptor == descriptor) {
                        Some(m) => m.fill_missing(&v),
                        None => moments.push(ResponseMoments::from_row(descriptor.to_string(), &v)),
                    }
                }
                ("expansion" | "integration" | "numerical", None) => {}
                _ => moments.push(ResponseMoments::from_row(label.to_string(), &v)),
            }
        } else {
            break;
        }
        i += 1;
    }
    i
}

fn read_sobol(lines: &[&str], start: usize, response: &str, sobol: &mut Vec<SobolIndex>) -> usize {
    let mut i = start;
    while i < lines.len() {
        let line = lines[i].trim();
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields == ["Main", "Total"] {
            i += 1;
            continue;
        }
        match (fields.len(), numbers(fields.get(..2).unwrap_or_default())) {
            (3, Some(v)) => sobol.push(SobolIndex {
                response: response.to_string(),
                variable: fields[2].to_string(),
                main: v[0],
                total: v[1],
            }),
            _ => break,
        }
        i += 1;
    }
    i
}
