//! Reading and writing experiment configuration files.
//!
//! Relative paths in a loaded file (`run_directory`, `template_file`,
//! `auxiliary_files`) are taken relative to the file's own directory, so a
//! configuration means the same thing whichever directory it is read from.

use std::fs;
use std::path::{Path, PathBuf};

use dakotathon_core::{DEFAULT_CONFIG_FILE, ExperimentConfig};
use tracing::{debug, info};

use crate::error::{Result, RunError};

pub fn load(path: &Path) -> Result<ExperimentConfig> {
    let text = fs::read_to_string(path).map_err(RunError::io(path))?;
    let mut config = ExperimentConfig::from_yaml(&text).map_err(|e| RunError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    resolve_paths(&mut config, base);
    debug!(path = %path.display(), method = %config.method.kind(), "loaded configuration");
    Ok(config)
}

pub fn save(config: &ExperimentConfig, path: &Path) -> Result<()> {
    let text = config.to_yaml()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(RunError::io(parent))?;
    }
    fs::write(path, text).map_err(RunError::io(path))?;
    info!(path = %path.display(), "wrote configuration");
    Ok(())
}

/// Search `start` and then each parent directory for a configuration file.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

fn resolve_paths(config: &mut ExperimentConfig, base: &Path) {
    let resolve = |p: &Path| -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
        }
    };
    config.run_directory = resolve(&config.run_directory);
    if let Some(template) = &config.template_file {
        config.template_file = Some(resolve(template));
    }
    config.auxiliary_files = config.auxiliary_files.iter().map(|p| resolve(p)).collect();
}
