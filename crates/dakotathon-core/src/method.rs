//! The `method` block: which Dakota iterator runs the experiment.
//!
//! Parameter studies walk the design space on a fixed stencil; the
//! uncertainty methods (sampling, stochastic expansions, MOAT screening)
//! treat the variables as random and need uncertain variable types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    VectorParameterStudy,
    CenteredParameterStudy,
    MultidimParameterStudy,
    Sampling,
    PolynomialChaos,
    StochCollocation,
    PsuadeMoat,
}

impl MethodKind {
    pub const ALL: [MethodKind; 7] = [
        MethodKind::VectorParameterStudy,
        MethodKind::CenteredParameterStudy,
        MethodKind::MultidimParameterStudy,
        MethodKind::Sampling,
        MethodKind::PolynomialChaos,
        MethodKind::StochCollocation,
        MethodKind::PsuadeMoat,
    ];

    /// Dakota keyword for the method.
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::VectorParameterStudy => "vector_parameter_study",
            MethodKind::CenteredParameterStudy => "centered_parameter_study",
            MethodKind::MultidimParameterStudy => "multidim_parameter_study",
            MethodKind::Sampling => "sampling",
            MethodKind::PolynomialChaos => "polynomial_chaos",
            MethodKind::StochCollocation => "stoch_collocation",
            MethodKind::PsuadeMoat => "psuade_moat",
        }
    }

    /// Name of the component that wraps an experiment using this method.
    pub fn component_name(self) -> &'static str {
        match self {
            MethodKind::VectorParameterStudy => "VectorParameterStudy",
            MethodKind::CenteredParameterStudy => "CenteredParameterStudy",
            MethodKind::MultidimParameterStudy => "MultidimParameterStudy",
            MethodKind::Sampling => "Sampling",
            MethodKind::PolynomialChaos => "PolynomialChaos",
            MethodKind::StochCollocation => "StochasticCollocation",
            MethodKind::PsuadeMoat => "PsuadeMoat",
        }
    }

    /// Uncertainty methods sample or integrate over uncertain variables.
    pub fn is_uncertainty(self) -> bool {
        matches!(
            self,
            MethodKind::Sampling
                | MethodKind::PolynomialChaos
                | MethodKind::StochCollocation
                | MethodKind::PsuadeMoat
        )
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MethodKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.component_name() == s)
            .ok_or_else(|| Error::UnknownKind {
                section: "method",
                name: s.to_string(),
            })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    #[default]
    Random,
    Lhs,
}

impl SampleType {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleType::Random => "random",
            SampleType::Lhs => "lhs",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisPolynomialFamily {
    Askey,
    Extended,
    Wiener,
}

impl BasisPolynomialFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            BasisPolynomialFamily::Askey => "askey",
            BasisPolynomialFamily::Extended => "extended",
            BasisPolynomialFamily::Wiener => "wiener",
        }
    }
}

/// How the coefficients of a stochastic expansion are computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoefficientEstimation {
    QuadratureOrder(u32),
    SparseGridLevel(u32),
    CubatureIntegrand(u32),
}

impl Default for CoefficientEstimation {
    fn default() -> Self {
        CoefficientEstimation::QuadratureOrder(2)
    }
}

impl CoefficientEstimation {
    fn keyword(self) -> (&'static str, u32) {
        match self {
            CoefficientEstimation::QuadratureOrder(n) => ("quadrature_order", n),
            CoefficientEstimation::SparseGridLevel(n) => ("sparse_grid_level", n),
            CoefficientEstimation::CubatureIntegrand(n) => ("cubature_integrand", n),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorParameterStudy {
    pub final_point: Vec<f64>,
    pub num_steps: u32,
}

impl Default for VectorParameterStudy {
    fn default() -> Self {
        Self {
            final_point: vec![1.1, 1.3],
            num_steps: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CenteredParameterStudy {
    pub steps_per_variable: Vec<u32>,
    pub step_vector: Vec<f64>,
}

impl Default for CenteredParameterStudy {
    fn default() -> Self {
        Self {
            steps_per_variable: vec![5, 4],
            step_vector: vec![0.4, 0.5],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultidimParameterStudy {
    pub partitions: Vec<u32>,
}

impl Default for MultidimParameterStudy {
    fn default() -> Self {
        Self {
            partitions: vec![8, 8],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Sampling {
    pub sample_type: SampleType,
    pub samples: u32,
    pub seed: Option<u32>,
    pub probability_levels: Vec<f64>,
    pub response_levels: Vec<f64>,
    pub variance_based_decomp: bool,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            sample_type: SampleType::Random,
            samples: 10,
            seed: None,
            probability_levels: Vec::new(),
            response_levels: Vec::new(),
            variance_based_decomp: false,
        }
    }
}

/// Settings shared by `polynomial_chaos` and `stoch_collocation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StochasticExpansion {
    pub basis_polynomial_family: Option<BasisPolynomialFamily>,
    pub coefficient_estimation: CoefficientEstimation,
    pub sample_type: SampleType,
    /// Samples drawn on the expansion once it is built.
    pub samples: u32,
    pub seed: Option<u32>,
    pub probability_levels: Vec<f64>,
    pub response_levels: Vec<f64>,
    pub variance_based_decomp: bool,
}

impl Default for StochasticExpansion {
    fn default() -> Self {
        Self {
            basis_polynomial_family: None,
            coefficient_estimation: CoefficientEstimation::default(),
            sample_type: SampleType::Random,
            samples: 10_000,
            seed: None,
            probability_levels: Vec::new(),
            response_levels: Vec::new(),
            variance_based_decomp: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PsuadeMoat {
    /// Grid partitions: one value for every variable, or one per variable.
    /// Empty leaves the keyword out.
    pub partitions: Vec<u32>,
    pub samples: u32,
    pub seed: Option<u32>,
}

impl Default for PsuadeMoat {
    fn default() -> Self {
        Self {
            partitions: vec![3],
            samples: 40,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Method {
    VectorParameterStudy(VectorParameterStudy),
    CenteredParameterStudy(CenteredParameterStudy),
    MultidimParameterStudy(MultidimParameterStudy),
    Sampling(Sampling),
    PolynomialChaos(StochasticExpansion),
    StochCollocation(StochasticExpansion),
    PsuadeMoat(PsuadeMoat),
}

impl Default for Method {
    fn default() -> Self {
        Method::VectorParameterStudy(VectorParameterStudy::default())
    }
}

impl From<MethodKind> for Method {
    fn from(kind: MethodKind) -> Self {
        match kind {
            MethodKind::VectorParameterStudy => Method::VectorParameterStudy(Default::default()),
            MethodKind::CenteredParameterStudy => {
                Method::CenteredParameterStudy(Default::default())
            }
            MethodKind::MultidimParameterStudy => {
                Method::MultidimParameterStudy(Default::default())
            }
            MethodKind::Sampling => Method::Sampling(Default::default()),
            MethodKind::PolynomialChaos => Method::PolynomialChaos(Default::default()),
            MethodKind::StochCollocation => Method::StochCollocation(Default::default()),
            MethodKind::PsuadeMoat => Method::PsuadeMoat(Default::default()),
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<MethodKind>().map(Method::from)
    }
}

impl Method {
    pub fn kind(&self) -> MethodKind {
        match self {
            Method::VectorParameterStudy(_) => MethodKind::VectorParameterStudy,
            Method::CenteredParameterStudy(_) => MethodKind::CenteredParameterStudy,
            Method::MultidimParameterStudy(_) => MethodKind::MultidimParameterStudy,
            Method::Sampling(_) => MethodKind::Sampling,
            Method::PolynomialChaos(_) => MethodKind::PolynomialChaos,
            Method::StochCollocation(_) => MethodKind::StochCollocation,
            Method::PsuadeMoat(_) => MethodKind::PsuadeMoat,
        }
    }

    pub fn render(&self) -> String {
        let mut b = Block::new("method");
        b.keyword(1, self.kind().as_str());

        match self {
            Method::VectorParameterStudy(m) => {
                b.reals(2, "final_point", &m.final_point)
                    .value(2, "num_steps", m.num_steps);
            }
            Method::CenteredParameterStudy(m) => {
                b.integers(2, "steps_per_variable", &m.steps_per_variable)
                    .reals(2, "step_vector", &m.step_vector);
            }
            Method::MultidimParameterStudy(m) => {
                b.integers(2, "partitions", &m.partitions);
            }
            Method::Sampling(m) => {
                b.keyword(2, &format!("sample_type = {}", m.sample_type.as_str()))
                    .value(2, "samples", m.samples);
                if let Some(seed) = m.seed {
                    b.value(2, "seed", seed);
                }
                b.reals(2, "probability_levels", &m.probability_levels)
                    .reals(2, "response_levels", &m.response_levels);
                if m.variance_based_decomp {
                    b.keyword(2, "variance_based_decomp");
                }
            }
            Method::PolynomialChaos(m) | Method::StochCollocation(m) => {
                if let Some(family) = m.basis_polynomial_family {
                    b.keyword(2, family.as_str());
                }
                let (keyword, level) = m.coefficient_estimation.keyword();
                b.value(2, keyword, level)
                    .keyword(2, &format!("sample_type = {}", m.sample_type.as_str()))
                    .value(2, "samples_on_emulator", m.samples);
                if let Some(seed) = m.seed {
                    b.value(2, "seed", seed);
                }
                b.reals(2, "probability_levels", &m.probability_levels)
                    .reals(2, "response_levels", &m.response_levels);
                if m.variance_based_decomp {
                    b.keyword(2, "variance_based_decomp");
                }
            }
            Method::PsuadeMoat(m) => {
                b.integers(2, "partitions", &m.partitions)
                    .value(2, "samples", m.samples);
                if let Some(seed) = m.seed {
                    b.value(2, "seed", seed);
                }
            }
        }

        b.finish()
    }

    /// Check settings against the number of variables in the experiment.
    pub fn validate(&self, n_variables: usize) -> Result<()> {
        match self {
            Method::VectorParameterStudy(m) => {
                per_variable("final_point", m.final_point.len(), n_variables)?;
            }
            Method::CenteredParameterStudy(m) => {
                per_variable("steps_per_variable", m.steps_per_variable.len(), n_variables)?;
                per_variable("step_vector", m.step_vector.len(), n_variables)?;
            }
            Method::MultidimParameterStudy(m) => {
                per_variable("partitions", m.partitions.len(), n_variables)?;
            }
            Method::Sampling(m) => {
                positive_samples(m.samples)?;
                probability_levels(&m.probability_levels)?;
            }
            Method::PolynomialChaos(m) => {
                positive_samples(m.samples)?;
                probability_levels(&m.probability_levels)?;
            }
            Method::StochCollocation(m) => {
                if let CoefficientEstimation::CubatureIntegrand(_) = m.coefficient_estimation {
                    return Err(Error::InvalidConfig(
                        "stoch_collocation does not support cubature_integrand".to_string(),
                    ));
                }
                positive_samples(m.samples)?;
                probability_levels(&m.probability_levels)?;
            }
            Method::PsuadeMoat(m) => {
                positive_samples(m.samples)?;
                if m.partitions.len() > 1 {
                    per_variable("partitions", m.partitions.len(), n_variables)?;
                }
            }
        }
        Ok(())
    }
}

fn per_variable(what: &str, found: usize, n_variables: usize) -> Result<()> {
    if found == n_variables {
        Ok(())
    } else {
        Err(Error::mismatch(
            format!("method {what} (one per variable)"),
            n_variables,
            found,
        ))
    }
}

fn positive_samples(samples: u32) -> Result<()> {
    if samples == 0 {
        return Err(Error::InvalidConfig("samples must be > 0".to_string()));
    }
    Ok(())
}

fn probability_levels(levels: &[f64]) -> Result<()> {
    match levels.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        Some(p) => Err(Error::InvalidConfig(format!(
            "probability level {p} is outside [0, 1]"
        ))),
        None => Ok(()),
    }
}
