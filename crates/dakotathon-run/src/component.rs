//! Dakota experiments behind an initialize / update / finalize lifecycle,
//! so a coupling framework can run a study as one model step.

use std::path::{Path, PathBuf};

use dakotathon_core::{Error, MethodKind};
use tracing::info;

use crate::dakota::{Dakota, DakotaResults};
use crate::error::Result;

pub trait Component {
    fn component_name(&self) -> &str;

    /// Prepare the experiment from a configuration file, or from the
    /// method's defaults when none is given.
    fn initialize(&mut self, config: Option<&Path>) -> Result<()>;

    /// Run the experiment and advance by one time step.
    fn update(&mut self) -> Result<()>;

    fn finalize(&mut self) -> Result<()>;

    fn start_time(&self) -> f64 {
        0.0
    }

    fn end_time(&self) -> f64 {
        1.0
    }

    fn current_time(&self) -> f64;

    fn time_step(&self) -> f64 {
        1.0
    }
}

pub struct DakotaComponent {
    kind: MethodKind,
    run_directory: Option<PathBuf>,
    executable: Option<String>,
    dakota: Option<Dakota>,
    results: Option<DakotaResults>,
    time: f64,
}

impl DakotaComponent {
    pub fn new(kind: MethodKind) -> Self {
        Self {
            kind,
            run_directory: None,
            executable: None,
            dakota: None,
            results: None,
            time: 0.0,
        }
    }

    /// Run default experiments in `dir` instead of the current directory.
    pub fn with_run_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.run_directory = Some(dir.into());
        self
    }

    pub fn with_executable(mut self, program: impl Into<String>) -> Self {
        self.executable = Some(program.into());
        self
    }

    pub fn dakota(&self) -> Option<&Dakota> {
        self.dakota.as_ref()
    }

    /// Results recorded by `finalize`.
    pub fn results(&self) -> Option<&DakotaResults> {
        self.results.as_ref()
    }

    fn not_initialized(&self) -> Error {
        Error::InvalidConfig(format!("{} has not been initialized", self.component_name()))
    }
}

impl Component for DakotaComponent {
    fn component_name(&self) -> &str {
        self.kind.component_name()
    }

    fn initialize(&mut self, config: Option<&Path>) -> Result<()> {
        let mut dakota = match config {
            Some(path) => {
                let dakota = Dakota::from_file(path)?;
                let kind = dakota.experiment().method.kind();
                if kind != self.kind {
                    return Err(Error::InvalidConfig(format!(
                        "{} runs {kind}, not {}",
                        path.display(),
                        self.kind
                    ))
                    .into());
                }
                dakota
            }
            None => {
                let dakota = Dakota::default_for(self.kind);
                match &self.run_directory {
                    Some(dir) => dakota.with_run_directory(dir.clone()),
                    None => dakota,
                }
            }
        };
        if let Some(program) = &self.executable {
            dakota = dakota.with_executable(program.clone());
        }
        dakota.setup()?;

        info!(component = self.component_name(), "initialized");
        self.dakota = Some(dakota);
        self.results = None;
        self.time = self.start_time();
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let err = self.not_initialized();
        let dakota = self.dakota.as_mut().ok_or(err)?;
        dakota.run()?;
        self.time += self.time_step();
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let err = self.not_initialized();
        let dakota = self.dakota.take().ok_or(err)?;
        self.results = Some(dakota.results()?);
        info!(component = self.component_name(), "finalized");
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_component_names() {
        let c = DakotaComponent::new(MethodKind::StochCollocation);
        assert_eq!(c.component_name(), "StochasticCollocation");
        assert_eq!(c.start_time(), 0.0);
        assert_eq!(c.end_time(), 1.0);
        assert_eq!(c.time_step(), 1.0);
    }

    #[test]
    fn test_initialize_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = DakotaComponent::new(MethodKind::Sampling).with_run_directory(dir.path());
        c.initialize(None).unwrap();
        assert!(dir.path().join("dakota.in").is_file());
        assert!(dir.path().join("dakota.yaml").is_file());
        assert_eq!(c.current_time(), 0.0);
    }

    #[test]
    fn test_initialize_rejects_other_method() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dakota.yaml");
        fs::write(&path, "method: polynomial_chaos\n").unwrap();

        let mut c = DakotaComponent::new(MethodKind::Sampling);
        let err = c.initialize(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("polynomial_chaos"), "{err}");
    }

    #[test]
    fn test_update_before_initialize() {
        let mut c = DakotaComponent::new(MethodKind::Sampling);
        assert!(c.update().is_err());
        assert!(c.finalize().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_lifecycle() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-dakota");
        fs::write(
            &script,
            "#!/bin/sh\necho '<<<<< Iterator sampling completed.' > \"$4\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut c = DakotaComponent::new(MethodKind::Sampling)
            .with_run_directory(dir.path().join("study"))
            .with_executable(script.display().to_string());
        c.initialize(None).unwrap();
        c.update().unwrap();
        assert_eq!(c.current_time(), 1.0);

        c.finalize().unwrap();
        assert!(c.dakota().is_none());
        assert!(c.results().unwrap().output.as_ref().unwrap().completed);
    }
}
