//! Experiment configuration file schema.
//!
//! ```yaml
//! run_directory: /data/hydrotrend-study
//! template_file: HYDRO.IN.dtmpl
//! auxiliary_files: [HYDRO0.HYPS]
//! plugin: hydrotrend
//! method:
//!   kind: sampling
//!   samples: 20
//!   seed: 17
//! variables:
//!   kind: uniform_uncertain
//!   descriptors: [starting_mean_annual_temperature, total_annual_precipitation]
//!   lower_bounds: [12.8, 1.4]
//!   upper_bounds: [15.8, 1.8]
//! responses:
//!   descriptors: [Qs_median]
//!   response_files: [HYDROASCII.QS]
//!   response_statistics: [median]
//! ```
//!
//! Every block section may also be given as a bare kind name
//! (`method: polynomial_chaos`) to take that kind's defaults. Omitted
//! sections are filled from the method's defaults. Unknown keys are an
//! error at every level.

use std::path::PathBuf;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DEFAULT_CONFIG_FILE, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::experiment::Experiment;
use crate::interface::Interface;
use crate::method::{Method, MethodKind};
use crate::responses::Responses;
use crate::variables::Variables;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub run_directory: PathBuf,
    pub input_file: String,
    pub output_file: String,
    pub configuration_file: String,
    /// Dakota template for the model input file (plugin runs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file: Option<PathBuf>,
    /// Extra model inputs copied alongside the generated input file.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auxiliary_files: Vec<PathBuf>,
    #[serde(
        deserialize_with = "optional_kind_or_table",
        skip_serializing_if = "Option::is_none"
    )]
    pub plugin: Option<PluginSettings>,
    pub environment: Environment,
    #[serde(deserialize_with = "kind_or_table")]
    pub method: Method,
    #[serde(
        deserialize_with = "optional_kind_or_table",
        skip_serializing_if = "Option::is_none"
    )]
    pub variables: Option<Variables>,
    #[serde(
        deserialize_with = "optional_kind_or_table",
        skip_serializing_if = "Option::is_none"
    )]
    pub interface: Option<Interface>,
    #[serde(deserialize_with = "kind_or_table")]
    pub responses: Responses,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::for_method(MethodKind::VectorParameterStudy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    #[serde(rename = "hydrotrend")]
    HydroTrend,
    /// Any executable driven through a template and output files.
    Model,
}

impl PluginKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PluginKind::HydroTrend => "hydrotrend",
            PluginKind::Model => "model",
        }
    }
}

/// Which model adapter the analysis driver runs, with optional overrides
/// of the adapter's defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginSettings {
    pub name: PluginKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    /// Arguments; `{input_dir}`, `{output_dir}` and `{input_file}` are
    /// replaced with the evaluation's paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    /// Header lines to skip when reading model output files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_lines: Option<usize>,
}

impl PluginSettings {
    pub fn new(name: PluginKind) -> Self {
        Self {
            name,
            executable: None,
            args: None,
            input_dir: None,
            output_dir: None,
            input_file: None,
            header_lines: None,
        }
    }
}

impl FromStr for PluginSettings {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "hydrotrend" => PluginKind::HydroTrend,
            "model" => PluginKind::Model,
            _ => {
                return Err(Error::UnknownKind {
                    section: "plugin",
                    name: s.to_string(),
                });
            }
        };
        Ok(Self::new(kind))
    }
}

impl ExperimentConfig {
    pub fn for_method(kind: MethodKind) -> Self {
        Self {
            run_directory: PathBuf::from("."),
            input_file: DEFAULT_INPUT_FILE.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            configuration_file: DEFAULT_CONFIG_FILE.to_string(),
            template_file: None,
            auxiliary_files: Vec::new(),
            plugin: None,
            environment: Environment::default(),
            method: Method::from(kind),
            variables: None,
            interface: None,
            responses: Responses::default(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Resolve omitted sections and validate the resulting study.
    ///
    /// Without an explicit interface, a configured plugin gets the fork
    /// interface running the plugin driver; otherwise the study evaluates
    /// Dakota's built-in Rosenbrock function.
    pub fn experiment(&self) -> Result<Experiment> {
        let defaults = Experiment::default_for(self.method.kind());
        let interface = match (&self.interface, &self.plugin) {
            (Some(interface), _) => interface.clone(),
            (None, Some(_)) => Interface::fork(),
            (None, None) => defaults.interface,
        };
        let experiment = Experiment {
            environment: self.environment.clone(),
            method: self.method.clone(),
            variables: self.variables.clone().unwrap_or(defaults.variables),
            interface,
            responses: self.responses.clone(),
        };
        experiment.validate()?;
        if experiment.interface.drives_plugin() && self.plugin.is_none() {
            return Err(Error::InvalidConfig(
                "interface runs the plugin driver but no plugin is configured".to_string(),
            ));
        }
        Ok(experiment)
    }

    /// Replace the block sections with a resolved experiment, so the saved
    /// file lists every setting that was used.
    pub fn pin(&mut self, experiment: &Experiment) {
        self.environment = experiment.environment.clone();
        self.method = experiment.method.clone();
        self.variables = Some(experiment.variables.clone());
        self.interface = Some(experiment.interface.clone());
        self.responses = experiment.responses.clone();
    }
}

/// A bare string names a kind; anything else is that kind's full table.
fn kind_or_table<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr<Err = Error>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(name) => name.parse().map_err(de::Error::custom),
        table => T::deserialize(table).map_err(de::Error::custom),
    }
}

fn optional_kind_or_table<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr<Err = Error>,
{
    kind_or_table(deserializer).map(Some)
}
