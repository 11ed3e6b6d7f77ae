//! Object model for Dakota studies.
//!
//! Describes an experiment as environment, method, variables, interface and
//! responses blocks and renders them as a Dakota input file. Also parses the
//! text Dakota exchanges with an analysis driver (parameters and results
//! files) and what it writes back (tabular data and output files), and
//! fills model input templates.
//!
//! Zero I/O: every function works on strings. Files and processes live in
//! `dakotathon-run`.

pub mod block;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod experiment;
pub mod interface;
pub mod method;
pub mod output;
pub mod params;
pub mod responses;
pub mod results;
pub mod statistics;
pub mod template;
pub mod variables;

pub use config::{ExperimentConfig, PluginKind, PluginSettings};
pub use constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATA_FILE, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE,
    DEFAULT_PARAMETERS_FILE, DEFAULT_RESULTS_FILE, FAIL_TOKEN, PLUGIN_DRIVER,
};
pub use environment::Environment;
pub use error::{Error, Result};
pub use experiment::Experiment;
pub use interface::{Fork, Interface, InterfaceMode, WorkDirectory};
pub use method::{
    BasisPolynomialFamily, CoefficientEstimation, Method, MethodKind, SampleType, Sampling,
    StochasticExpansion,
};
pub use output::{DakotaOutput, ResponseMoments, SobolIndex, TabularData};
pub use params::{ParametersFile, ResponseRequest};
pub use responses::{Gradients, Hessians, ResponseKind, Responses};
pub use results::{failure, format_results};
pub use statistics::Statistic;
pub use template::{
    merge_dakota_template, parameter_defaults, placeholders, render_defaults, substitute,
};
pub use variables::{ContinuousDesign, NormalUncertain, UniformUncertain, Variables};
