use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{Error, Result};
use crate::statistics::Statistic;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    #[default]
    ResponseFunctions,
    ObjectiveFunctions,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::ResponseFunctions => "response_functions",
            ResponseKind::ObjectiveFunctions => "objective_functions",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gradients {
    #[default]
    NoGradients,
    NumericalGradients,
    AnalyticGradients,
}

impl Gradients {
    pub fn as_str(self) -> &'static str {
        match self {
            Gradients::NoGradients => "no_gradients",
            Gradients::NumericalGradients => "numerical_gradients",
            Gradients::AnalyticGradients => "analytic_gradients",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hessians {
    #[default]
    NoHessians,
    NumericalHessians,
    AnalyticHessians,
}

impl Hessians {
    pub fn as_str(self) -> &'static str {
        match self {
            Hessians::NoHessians => "no_hessians",
            Hessians::NumericalHessians => "numerical_hessians",
            Hessians::AnalyticHessians => "analytic_hessians",
        }
    }
}

/// The `responses` block, plus the model outputs each response is computed
/// from when a plugin drives the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Responses {
    pub kind: ResponseKind,
    pub descriptors: Vec<String>,
    /// Model output file each response is read from (plugin runs only).
    pub response_files: Vec<String>,
    /// Statistic applied to each response file's series.
    pub response_statistics: Vec<String>,
    pub gradients: Gradients,
    pub hessians: Hessians,
}

impl Default for Responses {
    fn default() -> Self {
        Self {
            kind: ResponseKind::ResponseFunctions,
            descriptors: vec!["y1".to_string()],
            response_files: Vec::new(),
            response_statistics: Vec::new(),
            gradients: Gradients::NoGradients,
            hessians: Hessians::NoHessians,
        }
    }
}

impl FromStr for Responses {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s {
            "response_functions" => ResponseKind::ResponseFunctions,
            "objective_functions" => ResponseKind::ObjectiveFunctions,
            _ => {
                return Err(Error::UnknownKind {
                    section: "responses",
                    name: s.to_string(),
                });
            }
        };
        Ok(Self {
            kind,
            ..Default::default()
        })
    }
}

impl Responses {
    pub fn render(&self) -> String {
        let mut b = Block::new("responses");
        b.value(1, self.kind.as_str(), self.descriptors.len())
            .strings(2, "descriptors", &self.descriptors)
            .keyword(1, self.gradients.as_str())
            .keyword(1, self.hessians.as_str());
        b.finish()
    }

    /// Parsed `response_statistics`, one per response file.
    pub fn statistics(&self) -> Result<Vec<Statistic>> {
        self.response_statistics.iter().map(|s| s.parse()).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.descriptors.is_empty() {
            return Err(Error::InvalidConfig(
                "responses need at least one descriptor".to_string(),
            ));
        }
        if !self.response_files.is_empty() || !self.response_statistics.is_empty() {
            if self.response_statistics.len() != self.response_files.len() {
                return Err(Error::mismatch(
                    "response_statistics (one per response file)",
                    self.response_files.len(),
                    self.response_statistics.len(),
                ));
            }
            if self.response_files.len() != self.descriptors.len() {
                return Err(Error::mismatch(
                    "response_files (one per response descriptor)",
                    self.descriptors.len(),
                    self.response_files.len(),
                ));
            }
            self.statistics()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrotrend_responses() -> Responses {
        Responses {
            descriptors: vec!["Qs_median".to_string()],
            response_files: vec!["HYDROASCII.QS".to_string()],
            response_statistics: vec!["median".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_block() {
        let s = Responses::default().render();
        assert_eq!(
            s,
            "responses\n  response_functions = 1\n    descriptors = 'y1'\n  no_gradients\n  no_hessians\n\n"
        );
    }

    #[test]
    fn test_objective_functions_block() {
        let r: Responses = "objective_functions".parse().unwrap();
        assert!(r.render().contains("  objective_functions = 1\n"));
    }

    #[test]
    fn test_response_files_validate() {
        let r = hydrotrend_responses();
        assert!(r.validate().is_ok());
        assert_eq!(r.statistics().unwrap(), vec![Statistic::Median]);
    }

    #[test]
    fn test_statistics_must_pair_with_files() {
        let mut r = hydrotrend_responses();
        r.response_statistics.push("mean".to_string());
        assert!(matches!(
            r.validate().unwrap_err(),
            Error::Mismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_statistic_rejected() {
        let mut r = hydrotrend_responses();
        r.response_statistics = vec!["mode".to_string()];
        assert!(matches!(
            r.validate().unwrap_err(),
            Error::UnknownStatistic(_)
        ));
    }

    #[test]
    fn test_no_descriptors() {
        let r = Responses {
            descriptors: Vec::new(),
            ..Default::default()
        };
        assert!(r.validate().is_err());
    }
}
