/// Dakota input file written into the run directory
pub const DEFAULT_INPUT_FILE: &str = "dakota.in";

/// Dakota output file (`dakota -o`)
pub const DEFAULT_OUTPUT_FILE: &str = "dakota.out";

/// Tabular data file named in the environment block
pub const DEFAULT_DATA_FILE: &str = "dakota.dat";

/// Serialized experiment configuration, also used by the analysis driver
pub const DEFAULT_CONFIG_FILE: &str = "dakota.yaml";

/// Parameters file Dakota writes before each fork evaluation
pub const DEFAULT_PARAMETERS_FILE: &str = "params.in";

/// Results file the analysis driver writes back
pub const DEFAULT_RESULTS_FILE: &str = "results.out";

/// Analysis driver used by fork interfaces that run a model plugin
pub const PLUGIN_DRIVER: &str = "dakotathon run-plugin";

/// Interface id written for plugin-driven experiments
pub const DEFAULT_INTERFACE_ID: &str = "CSDMS";

/// Work directory stem for fork evaluations (`run.1`, `run.2`, ...)
pub const DEFAULT_WORK_DIRECTORY: &str = "run";

/// Token written to a results file when an evaluation fails
pub const FAIL_TOKEN: &str = "FAIL";
