//! Model adapters run by the analysis driver, one evaluation at a time.
//!
//! An evaluation is `setup` (write the model input from the parameters
//! file), `call` (run the model), `calculate` (reduce each model output
//! file to one response value) and `write` (answer Dakota).

mod hydrotrend;
mod model;

use std::path::Path;

use dakotathon_core::{ExperimentConfig, ParametersFile, PluginKind, PluginSettings};

use crate::error::Result;

pub use hydrotrend::{
    HYDROTREND_INPUT_DIR, HYDROTREND_INPUT_FILE, HYDROTREND_OUTPUT_DIR, hydrotrend,
    is_hydrotrend_installed,
};
pub use model::ModelPlugin;

pub trait Plugin {
    fn name(&self) -> &str;

    /// Prepare the model's input and output directories under `run_dir`.
    fn setup(
        &mut self,
        config: &ExperimentConfig,
        params: &ParametersFile,
        run_dir: &Path,
    ) -> Result<()>;

    /// Run the model. `Ok(false)` means setup has not happened and the
    /// model was not run.
    fn call(&mut self) -> Result<bool>;

    /// Read one model output file as a series; `None` if it is missing.
    fn load(&self, path: &Path) -> Result<Option<Vec<f64>>>;

    /// Compute every configured response from the model output.
    fn calculate(&mut self) -> Result<()>;

    /// Write the responses `params` requested to a results file.
    fn write(&self, params: &ParametersFile, results_path: &Path) -> Result<()>;
}

pub fn load_plugin(settings: &PluginSettings) -> Box<dyn Plugin> {
    let plugin = match settings.name {
        PluginKind::HydroTrend => hydrotrend(),
        PluginKind::Model => ModelPlugin::new("model", "./model"),
    };
    Box::new(plugin.with_settings(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_plugin_by_name() {
        let plugin = load_plugin(&PluginSettings::new(PluginKind::HydroTrend));
        assert_eq!(plugin.name(), "hydrotrend");

        let mut settings = PluginSettings::new(PluginKind::Model);
        settings.executable = Some("/opt/model/bin/run".to_string());
        let plugin = load_plugin(&settings);
        assert_eq!(plugin.name(), "model");
    }
}
