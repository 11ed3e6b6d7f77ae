//! Parser for the parameters file Dakota writes before each fork evaluation.
//!
//! Two layouts exist. The standard one puts the value first:
//!
//! ```text
//!                     2 variables
//! 1.500000000000000e+01 T
//! 1.600000000000000e+00 P
//!                     1 functions
//!                     1 ASV_1:Qs_median
//!                     2 derivative_variables
//!                     1 DVV_1:T
//!                     2 DVV_2:P
//!                     0 analysis_components
//!                     1 eval_id
//! ```
//!
//! The APREPRO layout wraps each entry in braces with the tag first:
//! `{ DAKOTA_VARS = 2 }`, `{ T = 1.5e+01 }`, `{ ASV_1:Qs_median = 1 }`.
//! Both are reduced to the same `(value, tag)` entries before parsing.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// One requested response: its descriptor and the active set vector entry
/// (1 = value, 2 = gradient, 4 = hessian, summed).
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseRequest {
    pub label: String,
    pub asv: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParametersFile {
    /// Variables in Dakota's order.
    pub variables: Vec<(String, f64)>,
    pub responses: Vec<ResponseRequest>,
    pub derivative_variables: Vec<String>,
    pub analysis_components: Vec<String>,
    pub eval_id: Option<String>,
}

struct Entry<'a> {
    line: usize,
    value: &'a str,
    tag: &'a str,
}

#[derive(Clone, Copy)]
enum Section {
    Variables,
    Functions,
    DerivativeVariables,
    AnalysisComponents,
    EvalId,
    Other,
}

fn section_for(tag: &str) -> Option<Section> {
    match tag {
        "variables" | "DAKOTA_VARS" => Some(Section::Variables),
        "functions" | "DAKOTA_FNS" => Some(Section::Functions),
        "derivative_variables" | "DAKOTA_DER_VARS" => Some(Section::DerivativeVariables),
        "analysis_components" | "DAKOTA_AN_COMPS" => Some(Section::AnalysisComponents),
        "eval_id" | "DAKOTA_EVAL_ID" => Some(Section::EvalId),
        "metadata" | "DAKOTA_METADATA" => Some(Section::Other),
        _ => None,
    }
}

impl ParametersFile {
    pub fn parse(text: &str) -> Result<Self> {
        let entries = entries(text)?;
        let mut params = ParametersFile::default();
        let mut i = 0;

        while i < entries.len() {
            let header = &entries[i];
            let section = section_for(header.tag).ok_or_else(|| {
                Error::parse(header.line, format!("unexpected entry '{}'", header.tag))
            })?;
            i += 1;

            if let Section::EvalId = section {
                params.eval_id = Some(header.value.to_string());
                continue;
            }

            let count: usize = header.value.parse().map_err(|_| {
                Error::parse(
                    header.line,
                    format!("expected a count for '{}', got '{}'", header.tag, header.value),
                )
            })?;
            let body = i
                .checked_add(count)
                .and_then(|end| entries.get(i..end))
                .ok_or_else(|| {
                    Error::parse(
                        header.line,
                        format!("'{}' section truncated, expected {count} entries", header.tag),
                    )
                })?;
            i += count;

            for entry in body {
                match section {
                    Section::Variables => {
                        let value = parse_real(entry)?;
                        params.variables.push((entry.tag.to_string(), value));
                    }
                    Section::Functions => {
                        let asv = entry.value.parse().map_err(|_| {
                            Error::parse(entry.line, format!("bad ASV value '{}'", entry.value))
                        })?;
                        params.responses.push(ResponseRequest {
                            label: tag_label(entry.tag).to_string(),
                            asv,
                        });
                    }
                    Section::DerivativeVariables => {
                        params
                            .derivative_variables
                            .push(tag_label(entry.tag).to_string());
                    }
                    Section::AnalysisComponents => {
                        params
                            .analysis_components
                            .push(entry.value.trim_matches('"').to_string());
                    }
                    Section::EvalId | Section::Other => {}
                }
            }
        }

        Ok(params)
    }

    /// Response labels in the order Dakota expects results back.
    pub fn response_descriptors(&self) -> Vec<&str> {
        self.responses.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Variable values keyed by descriptor, for template substitution.
    pub fn values(&self) -> HashMap<String, String> {
        self.variables
            .iter()
            .map(|(name, value)| (name.clone(), crate::block::real(*value)))
            .collect()
    }
}

fn entries(text: &str) -> Result<Vec<Entry<'_>>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let entry = if let Some(inner) = trimmed.strip_prefix('{') {
            let inner = inner
                .strip_suffix('}')
                .ok_or_else(|| Error::parse(line, "unterminated '{' entry"))?;
            let (tag, value) = inner
                .split_once('=')
                .ok_or_else(|| Error::parse(line, "expected 'tag = value'"))?;
            Entry {
                line,
                value: value.trim(),
                tag: tag.trim(),
            }
        } else {
            let (value, tag) = trimmed
                .split_once(char::is_whitespace)
                .ok_or_else(|| Error::parse(line, "expected 'value tag'"))?;
            Entry {
                line,
                value,
                tag: tag.trim(),
            }
        };
        out.push(entry);
    }
    Ok(out)
}

fn parse_real(entry: &Entry<'_>) -> Result<f64> {
    entry.value.parse().map_err(|_| {
        Error::parse(
            entry.line,
            format!("value '{}' of '{}' is not a number", entry.value, entry.tag),
        )
    })
}

/// `ASV_1:Qs_median` -> `Qs_median`
fn tag_label(tag: &str) -> &str {
    tag.split_once(':').map_or(tag, |(_, label)| label)
}
