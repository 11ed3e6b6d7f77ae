//! The analysis driver: one model evaluation per Dakota fork.
//!
//! Dakota calls `dakotathon run-plugin <params> <results>` from the
//! evaluation's working directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dakotathon_core::{Error, ParametersFile};
use tracing::{error, info};

use crate::config_file::{self, find_config};
use crate::error::{Result, RunError};
use crate::files::write_failure;
use crate::plugin::load_plugin;

/// Evaluate the configured plugin for one parameters file.
///
/// Without `config_path`, the configuration is searched for from the
/// current directory upward. Once the parameters file has been read, any
/// failure leaves `FAIL` in the results file before the error is returned.
pub fn run_plugin(params_path: &Path, results_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(params_path).map_err(RunError::io(params_path))?;

    match evaluate(&text, params_path, results_path, config_path) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, params = %params_path.display(), "evaluation failed");
            if let Err(write_err) = write_failure(results_path) {
                error!(error = %write_err, "could not mark the evaluation failed");
            }
            Err(e)
        }
    }
}

fn evaluate(
    text: &str,
    params_path: &Path,
    results_path: &Path,
    config_path: Option<&Path>,
) -> Result<()> {
    let params = ParametersFile::parse(text)?;
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = current_dir()?;
            find_config(&cwd).ok_or(RunError::ConfigNotFound(cwd))?
        }
    };
    let config = config_file::load(&config_path)?;
    config.responses.validate()?;
    let settings = config.plugin.as_ref().ok_or_else(|| {
        Error::InvalidConfig(format!("{} has no plugin section", config_path.display()))
    })?;

    let params_path = std::path::absolute(params_path).map_err(RunError::io(params_path))?;
    let run_dir = match params_path.parent() {
        Some(dir) => dir.to_path_buf(),
        None => current_dir()?,
    };

    let mut plugin = load_plugin(settings);
    info!(
        plugin = plugin.name(),
        eval_id = params.eval_id.as_deref().unwrap_or("?"),
        dir = %run_dir.display(),
        "evaluating"
    );
    plugin.setup(&config, &params, &run_dir)?;
    if !plugin.call()? {
        return Err(Error::InvalidConfig(format!(
            "the {} plugin did not run its model",
            plugin.name()
        ))
        .into());
    }
    plugin.calculate()?;
    plugin.write(&params, results_path)
}

fn current_dir() -> Result<PathBuf> {
    env::current_dir().map_err(RunError::io(Path::new(".")))
}
