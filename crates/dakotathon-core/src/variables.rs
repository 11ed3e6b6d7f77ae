use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variables {
    ContinuousDesign(ContinuousDesign),
    UniformUncertain(UniformUncertain),
    NormalUncertain(NormalUncertain),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContinuousDesign {
    pub descriptors: Vec<String>,
    pub initial_point: Vec<f64>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
}

impl Default for ContinuousDesign {
    fn default() -> Self {
        Self {
            descriptors: default_descriptors(),
            initial_point: vec![-0.3, 0.2],
            lower_bounds: vec![-2.0, -2.0],
            upper_bounds: vec![2.0, 2.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniformUncertain {
    pub descriptors: Vec<String>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
    pub initial_point: Vec<f64>,
}

impl Default for UniformUncertain {
    fn default() -> Self {
        Self {
            descriptors: default_descriptors(),
            lower_bounds: vec![-2.0, -2.0],
            upper_bounds: vec![2.0, 2.0],
            initial_point: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalUncertain {
    pub descriptors: Vec<String>,
    pub means: Vec<f64>,
    pub std_deviations: Vec<f64>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
    pub initial_point: Vec<f64>,
}

impl Default for NormalUncertain {
    fn default() -> Self {
        Self {
            descriptors: default_descriptors(),
            means: vec![0.0, 0.0],
            std_deviations: vec![1.0, 1.0],
            lower_bounds: Vec::new(),
            upper_bounds: Vec::new(),
            initial_point: Vec::new(),
        }
    }
}

fn default_descriptors() -> Vec<String> {
    vec!["x1".to_string(), "x2".to_string()]
}

impl Default for Variables {
    fn default() -> Self {
        Variables::ContinuousDesign(ContinuousDesign::default())
    }
}

impl FromStr for Variables {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "continuous_design" => Ok(Variables::ContinuousDesign(Default::default())),
            "uniform_uncertain" => Ok(Variables::UniformUncertain(Default::default())),
            "normal_uncertain" => Ok(Variables::NormalUncertain(Default::default())),
            _ => Err(Error::UnknownKind {
                section: "variables",
                name: s.to_string(),
            }),
        }
    }
}

impl Variables {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Variables::ContinuousDesign(_) => "continuous_design",
            Variables::UniformUncertain(_) => "uniform_uncertain",
            Variables::NormalUncertain(_) => "normal_uncertain",
        }
    }

    pub fn descriptors(&self) -> &[String] {
        match self {
            Variables::ContinuousDesign(v) => &v.descriptors,
            Variables::UniformUncertain(v) => &v.descriptors,
            Variables::NormalUncertain(v) => &v.descriptors,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors().is_empty()
    }

    pub fn is_uncertain(&self) -> bool {
        !matches!(self, Variables::ContinuousDesign(_))
    }

    /// True when every variable has both a lower and an upper bound.
    pub fn is_bounded(&self) -> bool {
        let (lower, upper) = match self {
            Variables::ContinuousDesign(v) => (&v.lower_bounds, &v.upper_bounds),
            Variables::UniformUncertain(v) => (&v.lower_bounds, &v.upper_bounds),
            Variables::NormalUncertain(v) => (&v.lower_bounds, &v.upper_bounds),
        };
        !lower.is_empty() && !upper.is_empty()
    }

    pub fn render(&self) -> String {
        let mut b = Block::new("variables");
        b.value(1, self.kind_str(), self.len())
            .strings(2, "descriptors", self.descriptors());

        match self {
            Variables::ContinuousDesign(v) => {
                b.reals(2, "initial_point", &v.initial_point)
                    .reals(2, "lower_bounds", &v.lower_bounds)
                    .reals(2, "upper_bounds", &v.upper_bounds);
            }
            Variables::UniformUncertain(v) => {
                b.reals(2, "lower_bounds", &v.lower_bounds)
                    .reals(2, "upper_bounds", &v.upper_bounds)
                    .reals(2, "initial_point", &v.initial_point);
            }
            Variables::NormalUncertain(v) => {
                b.reals(2, "means", &v.means)
                    .reals(2, "std_deviations", &v.std_deviations)
                    .reals(2, "lower_bounds", &v.lower_bounds)
                    .reals(2, "upper_bounds", &v.upper_bounds)
                    .reals(2, "initial_point", &v.initial_point);
            }
        }

        b.finish()
    }

    pub fn validate(&self) -> Result<()> {
        let descriptors = self.descriptors();
        if descriptors.is_empty() {
            return Err(Error::InvalidConfig(
                "variables need at least one descriptor".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for d in descriptors {
            if d.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "variable descriptors must not be blank".to_string(),
                ));
            }
            if !seen.insert(d.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate variable descriptor '{d}'"
                )));
            }
        }

        let n = descriptors.len();
        match self {
            Variables::ContinuousDesign(v) => {
                optional_list("initial_point", &v.initial_point, n)?;
                optional_list("lower_bounds", &v.lower_bounds, n)?;
                optional_list("upper_bounds", &v.upper_bounds, n)?;
                ordered_bounds(descriptors, &v.lower_bounds, &v.upper_bounds)?;
            }
            Variables::UniformUncertain(v) => {
                required_list("lower_bounds", &v.lower_bounds, n)?;
                required_list("upper_bounds", &v.upper_bounds, n)?;
                optional_list("initial_point", &v.initial_point, n)?;
                ordered_bounds(descriptors, &v.lower_bounds, &v.upper_bounds)?;
            }
            Variables::NormalUncertain(v) => {
                required_list("means", &v.means, n)?;
                required_list("std_deviations", &v.std_deviations, n)?;
                optional_list("lower_bounds", &v.lower_bounds, n)?;
                optional_list("upper_bounds", &v.upper_bounds, n)?;
                optional_list("initial_point", &v.initial_point, n)?;
                ordered_bounds(descriptors, &v.lower_bounds, &v.upper_bounds)?;
                if let Some((d, s)) = descriptors
                    .iter()
                    .zip(&v.std_deviations)
                    .find(|(_, s)| **s <= 0.0)
                {
                    return Err(Error::InvalidConfig(format!(
                        "std deviation of '{d}' must be positive, got {s}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn required_list(what: &str, values: &[f64], n: usize) -> Result<()> {
    if values.len() != n {
        return Err(Error::mismatch(format!("variables {what}"), n, values.len()));
    }
    Ok(())
}

fn optional_list(what: &str, values: &[f64], n: usize) -> Result<()> {
    if values.is_empty() {
        Ok(())
    } else {
        required_list(what, values, n)
    }
}

fn ordered_bounds(descriptors: &[String], lower: &[f64], upper: &[f64]) -> Result<()> {
    for ((d, lo), hi) in descriptors.iter().zip(lower).zip(upper) {
        if lo >= hi {
            return Err(Error::InvalidConfig(format!(
                "lower bound {lo} of '{d}' is not below upper bound {hi}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(names: &[&str], lower: Vec<f64>, upper: Vec<f64>) -> Variables {
        Variables::UniformUncertain(UniformUncertain {
            descriptors: names.iter().map(|s| s.to_string()).collect(),
            lower_bounds: lower,
            upper_bounds: upper,
            initial_point: Vec::new(),
        })
    }

    #[test]
    fn test_default_design_block() {
        let s = Variables::default().render();
        assert_eq!(
            s,
            "variables\n  continuous_design = 2\n    descriptors = 'x1' 'x2'\n    \
             initial_point = -0.3 0.2\n    lower_bounds = -2.0 -2.0\n    upper_bounds = 2.0 2.0\n\n"
        );
    }

    #[test]
    fn test_uniform_block() {
        let vars = uniform(
            &["starting_mean_annual_temperature", "total_annual_precipitation"],
            vec![12.8, 1.4],
            vec![15.8, 1.8],
        );
        let s = vars.render();
        assert!(s.contains("  uniform_uncertain = 2\n"));
        assert!(s.contains(
            "    descriptors = 'starting_mean_annual_temperature' 'total_annual_precipitation'\n"
        ));
        assert!(s.contains("    lower_bounds = 12.8 1.4\n"));
        assert!(!s.contains("initial_point"));
        assert!(vars.validate().is_ok());
    }

    #[test]
    fn test_bounds_length_mismatch() {
        let vars = uniform(&["T", "P"], vec![1.0], vec![2.0, 3.0]);
        assert!(matches!(
            vars.validate().unwrap_err(),
            Error::Mismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_inverted_bounds() {
        let vars = uniform(&["T"], vec![5.0], vec![1.0]);
        assert!(vars.validate().is_err());
    }

    #[test]
    fn test_duplicate_descriptors() {
        let vars = uniform(&["T", "T"], vec![0.0, 0.0], vec![1.0, 1.0]);
        assert!(vars.validate().is_err());
    }

    #[test]
    fn test_empty_descriptors() {
        let vars = uniform(&[], vec![], vec![]);
        assert!(vars.validate().is_err());
    }

    #[test]
    fn test_normal_requires_positive_std() {
        let vars = Variables::NormalUncertain(NormalUncertain {
            std_deviations: vec![1.0, 0.0],
            ..Default::default()
        });
        assert!(vars.validate().is_err());
    }

    #[test]
    fn test_from_str() {
        let vars: Variables = "uniform_uncertain".parse().unwrap();
        assert!(vars.is_uncertain());
        assert!(vars.is_bounded());
        assert!("discrete_state".parse::<Variables>().is_err());
    }
}
