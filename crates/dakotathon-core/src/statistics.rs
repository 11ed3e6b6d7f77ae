//! Reductions applied to model output series to produce a single response.
//!
//! Names follow numpy (`mean`, `median`, `std`, ...) since response
//! statistics in existing experiment configurations use those names.
//! `std` and `var` are population statistics (ddof = 0).

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Median,
    Std,
    Var,
    Min,
    Max,
    Sum,
}

impl Statistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Std => "std",
            Statistic::Var => "var",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Sum => "sum",
        }
    }

    /// Reduce `series` to one value. NaN entries are ignored.
    pub fn compute(self, series: &[f64]) -> Result<f64> {
        let values: Vec<f64> = series.iter().copied().filter(|v| !v.is_nan()).collect();
        if values.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "cannot compute {} of an empty series",
                self.as_str()
            )));
        }

        let n = values.len() as f64;
        let value = match self {
            Statistic::Mean => values.iter().sum::<f64>() / n,
            Statistic::Median => median(values),
            Statistic::Std => variance(&values).sqrt(),
            Statistic::Var => variance(&values),
            Statistic::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Statistic::Sum => values.iter().sum(),
        };
        Ok(value)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "average" => Ok(Statistic::Mean),
            "median" => Ok(Statistic::Median),
            "std" => Ok(Statistic::Std),
            "var" => Ok(Statistic::Var),
            "min" | "amin" => Ok(Statistic::Min),
            "max" | "amax" => Ok(Statistic::Max),
            "sum" => Ok(Statistic::Sum),
            _ => Err(Error::UnknownStatistic(s.to_string())),
        }
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
