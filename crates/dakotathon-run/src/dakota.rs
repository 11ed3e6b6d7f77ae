//! Setting up a run directory and invoking the `dakota` executable.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use dakotathon_core::{
    DakotaOutput, Experiment, ExperimentConfig, MethodKind, PLUGIN_DRIVER, TabularData,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config_file;
use crate::error::{Result, RunError, stderr_tail};

/// Overrides the Dakota executable.
pub const DAKOTA_EXE_VAR: &str = "DAKOTA_EXE";
/// Overrides the command Dakota runs as its analysis driver.
pub const DRIVER_EXE_VAR: &str = "DAKOTATHON_EXE";

pub fn dakota_exe() -> String {
    env::var(DAKOTA_EXE_VAR).unwrap_or_else(|_| "dakota".to_string())
}

fn driver_exe() -> String {
    env::var(DRIVER_EXE_VAR).unwrap_or_else(|_| {
        PLUGIN_DRIVER
            .split_whitespace()
            .next()
            .unwrap_or("dakotathon")
            .to_string()
    })
}

/// Locate `program` the way a shell would: as given when it contains a path
/// separator, otherwise in each `PATH` directory.
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

pub fn is_dakota_installed() -> bool {
    which(&dakota_exe()).is_some()
}

/// What a finished run left behind.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DakotaResults {
    pub output: Option<DakotaOutput>,
    pub data: Option<TabularData>,
}

/// One experiment bound to its run directory.
#[derive(Clone, Debug)]
pub struct Dakota {
    config: ExperimentConfig,
    experiment: Experiment,
    executable: Option<String>,
    is_setup: bool,
}

impl Dakota {
    pub fn from_config(config: ExperimentConfig) -> Result<Self> {
        let experiment = config.experiment()?;
        Ok(Self {
            config,
            experiment,
            executable: None,
            is_setup: false,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_config(config_file::load(path)?)
    }

    /// Dakota's built-in Rosenbrock study for `kind`, in the current
    /// directory.
    pub fn default_for(kind: MethodKind) -> Self {
        Self {
            config: ExperimentConfig::for_method(kind),
            experiment: Experiment::default_for(kind),
            executable: None,
            is_setup: false,
        }
    }

    pub fn with_run_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.run_directory = dir.into();
        self.is_setup = false;
        self
    }

    /// Use `program` instead of `$DAKOTA_EXE` or `dakota`.
    pub fn with_executable(mut self, program: impl Into<String>) -> Self {
        self.executable = Some(program.into());
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    pub fn run_directory(&self) -> &Path {
        &self.config.run_directory
    }

    pub fn input_path(&self) -> PathBuf {
        self.run_directory().join(&self.config.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.run_directory().join(&self.config.output_file)
    }

    pub fn config_path(&self) -> PathBuf {
        self.run_directory().join(&self.config.configuration_file)
    }

    pub fn data_path(&self) -> Option<PathBuf> {
        self.experiment
            .environment
            .data_file
            .as_ref()
            .map(|f| self.run_directory().join(f))
    }

    /// Write everything Dakota needs into the run directory and return the
    /// input file path.
    ///
    /// Template and auxiliary files are copied into the run directory and
    /// the saved configuration refers to the copies by absolute path. When
    /// the interface runs the plugin driver, the driver command is pinned to
    /// that saved configuration so evaluations find it from any working
    /// directory.
    pub fn setup(&mut self) -> Result<PathBuf> {
        let run_dir = std::path::absolute(&self.config.run_directory)
            .map_err(RunError::io(&self.config.run_directory))?;
        fs::create_dir_all(&run_dir).map_err(RunError::io(&run_dir))?;
        self.config.run_directory = run_dir.clone();

        if let Some(template) = &self.config.template_file {
            self.config.template_file = Some(copy_into(template, &run_dir)?);
        }
        self.config.auxiliary_files = self
            .config
            .auxiliary_files
            .iter()
            .map(|f| copy_into(f, &run_dir))
            .collect::<Result<_>>()?;

        let config_path = self.config_path();
        if self.experiment.interface.drives_plugin() {
            self.experiment.interface.analysis_driver = format!(
                "{} run-plugin --config {}",
                driver_exe(),
                shell_word(&config_path)?
            );
            debug!(driver = %self.experiment.interface.analysis_driver, "pinned analysis driver");
        }
        self.config.pin(&self.experiment);

        let input_path = self.input_path();
        fs::write(&input_path, self.experiment.render()).map_err(RunError::io(&input_path))?;
        config_file::save(&self.config, &config_path)?;

        info!(
            path = %input_path.display(),
            method = %self.experiment.method.kind(),
            "wrote Dakota input file"
        );
        self.is_setup = true;
        Ok(input_path)
    }

    /// `dakota -i <input> -o <output>`, run from the run directory.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.arg("-i")
            .arg(&self.config.input_file)
            .arg("-o")
            .arg(&self.config.output_file)
            .current_dir(self.run_directory());
        cmd
    }

    /// The Dakota executable this experiment runs.
    pub fn program(&self) -> String {
        self.executable.clone().unwrap_or_else(dakota_exe)
    }

    /// Set up if needed, run Dakota to completion and read its results.
    pub fn run(&mut self) -> Result<DakotaResults> {
        if !self.is_setup {
            self.setup()?;
        }
        let program = self.program();
        info!(program = %program, dir = %self.run_directory().display(), "running Dakota");

        let output = self
            .command()
            .output()
            .map_err(|source| RunError::Spawn {
                program: program.clone(),
                source,
            })?;
        check_status(&program, &output)?;
        info!("Dakota finished");
        self.results()
    }

    /// Parse the output and tabular data files, skipping either if absent.
    pub fn results(&self) -> Result<DakotaResults> {
        let output_path = self.output_path();
        let output = match fs::read_to_string(&output_path) {
            Ok(text) => Some(DakotaOutput::parse(&text)),
            Err(_) => {
                warn!(path = %output_path.display(), "no Dakota output file");
                None
            }
        };

        let data = match self.data_path() {
            Some(path) if path.is_file() => {
                let text = fs::read_to_string(&path).map_err(RunError::io(&path))?;
                Some(TabularData::parse(&text)?)
            }
            _ => None,
        };

        Ok(DakotaResults { output, data })
    }
}

/// Turn a failed exit into `RunError::Process` carrying the end of stderr.
pub fn check_status(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(RunError::Process {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: stderr_tail(&output.stderr),
    })
}

fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let source = std::path::absolute(source).map_err(RunError::io(source))?;
    let Some(name) = source.file_name() else {
        return Ok(source);
    };
    let target = dir.join(name);
    if target != source {
        fs::copy(&source, &target).map_err(RunError::io(&source))?;
        debug!(from = %source.display(), to = %target.display(), "copied input file");
    }
    Ok(target)
}

/// Quote a path for the shell Dakota uses to launch the driver.
///
/// The word ends up inside a quoted Dakota string, so paths containing
/// quote characters cannot be expressed and are rejected.
fn shell_word(path: &Path) -> Result<String> {
    let s = path.display().to_string();
    if s.contains(['\'', '"']) {
        return Err(RunError::Config {
            path: path.to_path_buf(),
            message: "path contains a quote character and cannot be passed to the analysis driver"
                .to_string(),
        });
    }
    if s.chars().any(char::is_whitespace) {
        Ok(format!("\"{s}\""))
    } else {
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_writes_input_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut dakota =
            Dakota::default_for(MethodKind::VectorParameterStudy).with_run_directory(dir.path());

        let input = dakota.setup().unwrap();
        assert_eq!(input, dir.path().join("dakota.in"));
        let text = fs::read_to_string(&input).unwrap();
        assert!(text.contains("vector_parameter_study"));
        assert!(text.contains("analysis_drivers = 'rosenbrock'"));

        let saved = config_file::load(&dakota.config_path()).unwrap();
        assert_eq!(saved.experiment().unwrap(), *dakota.experiment());
    }

    #[test]
    fn test_setup_pins_plugin_driver() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("model.in.dtmpl");
        fs::write(&template, "{x1} {x2}\n").unwrap();
        let yaml = format!(
            "run_directory: {}\ntemplate_file: {}\nplugin: model\nmethod: sampling\nresponses:\n  descriptors: [y]\n  response_files: [y.txt]\n  response_statistics: [mean]\n",
            dir.path().join("study").display(),
            template.display()
        );
        let config = ExperimentConfig::from_yaml(&yaml).unwrap();
        let mut dakota = Dakota::from_config(config).unwrap();
        dakota.setup().unwrap();

        let driver = &dakota.experiment().interface.analysis_driver;
        assert!(driver.ends_with(&format!("run-plugin --config {}", dakota.config_path().display())));
        assert!(dakota.experiment().interface.drives_plugin());

        let saved = config_file::load(&dakota.config_path()).unwrap();
        let copied = dir.path().join("study").join("model.in.dtmpl");
        assert_eq!(saved.template_file.as_deref(), Some(copied.as_path()));
        assert!(copied.is_file());
    }

    #[test]
    fn test_shell_word() {
        assert_eq!(shell_word(Path::new("/data/study/dakota.yaml")).unwrap(), "/data/study/dakota.yaml");
        assert_eq!(
            shell_word(Path::new("/data/my study/dakota.yaml")).unwrap(),
            "\"/data/my study/dakota.yaml\""
        );
        for path in ["/data/bob's study/dakota.yaml", "/data/\"q\"/dakota.yaml"] {
            let err = shell_word(Path::new(path)).unwrap_err();
            assert!(matches!(err, RunError::Config { .. }), "{path}");
        }
    }

    #[test]
    fn test_command_line() {
        let dakota = Dakota::default_for(MethodKind::Sampling)
            .with_run_directory("/data/study")
            .with_executable("/opt/dakota/bin/dakota");
        let cmd = dakota.command();
        assert_eq!(cmd.get_program(), "/opt/dakota/bin/dakota");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-i", "dakota.in", "-o", "dakota.out"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/data/study")));
    }

    #[test]
    fn test_results_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let dakota = Dakota::default_for(MethodKind::Sampling).with_run_directory(dir.path());
        assert_eq!(dakota.results().unwrap(), DakotaResults::default());
    }

    #[test]
    fn test_which() {
        assert!(which("surely-not-a-real-program-name").is_none());
        assert!(which("/no/such/dir/dakota").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_with_stand_in_dakota() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-dakota");
        fs::write(
            &script,
            "#!/bin/sh\n\
             printf '<<<<< Function evaluation summary: 11 total (11 new, 0 duplicate)\\n<<<<< Iterator vector_parameter_study completed.\\n' > \"$4\"\n\
             printf '%%eval_id interface x1 x2 y1\\n1 NO_ID 0.1 0.2 1.5\\n' > dakota.dat\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut dakota = Dakota::default_for(MethodKind::VectorParameterStudy)
            .with_run_directory(dir.path().join("study"))
            .with_executable(script.display().to_string());
        let results = dakota.run().unwrap();

        let output = results.output.unwrap();
        assert_eq!(output.evaluations, Some(11));
        assert!(output.completed);
        assert_eq!(results.data.unwrap().column("y1").unwrap(), vec![1.5]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-dakota");
        fs::write(&script, "#!/bin/sh\necho 'Error: bad input' >&2\nexit 2\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut dakota = Dakota::default_for(MethodKind::Sampling)
            .with_run_directory(dir.path())
            .with_executable(script.display().to_string());
        let err = dakota.run().unwrap_err();
        assert!(matches!(err, RunError::Process { .. }));
        assert!(err.to_string().contains("Error: bad input"), "{err}");
    }
}
