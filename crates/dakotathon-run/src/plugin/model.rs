use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use dakotathon_core::{Error, ExperimentConfig, ParametersFile, PluginSettings, Statistic, substitute};
use tracing::{debug, info, warn};

use super::Plugin;
use crate::error::{Result, RunError, stderr_tail};
use crate::files;

/// A model driven through an input template and numeric output files.
///
/// Argument strings may contain `{input_dir}`, `{output_dir}` and
/// `{input_file}`, replaced with absolute paths for the evaluation.
#[derive(Clone, Debug)]
pub struct ModelPlugin {
    name: String,
    executable: String,
    args: Vec<String>,
    input_dir: String,
    output_dir: String,
    input_file: String,
    header_lines: usize,
    /// File names given to auxiliary files when copied, by position.
    auxiliary_names: Vec<String>,
    run_dir: Option<PathBuf>,
    responses: Vec<ResponseSource>,
    values: Vec<(String, f64)>,
}

#[derive(Clone, Debug)]
struct ResponseSource {
    descriptor: String,
    file: String,
    statistic: Statistic,
}

impl ModelPlugin {
    pub fn new(name: &str, executable: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: executable.to_string(),
            args: vec!["{input_file}".to_string()],
            input_dir: "input".to_string(),
            output_dir: "output".to_string(),
            input_file: "model.in".to_string(),
            header_lines: 0,
            auxiliary_names: Vec::new(),
            run_dir: None,
            responses: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_directories(mut self, input_dir: &str, output_dir: &str) -> Self {
        self.input_dir = input_dir.to_string();
        self.output_dir = output_dir.to_string();
        self
    }

    pub fn with_input_file(mut self, input_file: &str) -> Self {
        self.input_file = input_file.to_string();
        self
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    pub fn with_auxiliary_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auxiliary_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Apply the overrides present in a configuration's plugin section.
    pub fn with_settings(mut self, settings: &PluginSettings) -> Self {
        if let Some(executable) = &settings.executable {
            self.executable = executable.clone();
        }
        if let Some(args) = &settings.args {
            self.args = args.clone();
        }
        if let Some(dir) = &settings.input_dir {
            self.input_dir = dir.clone();
        }
        if let Some(dir) = &settings.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(file) = &settings.input_file {
            self.input_file = file.clone();
        }
        if let Some(lines) = settings.header_lines {
            self.header_lines = lines;
        }
        self
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn input_dir(&self) -> Option<PathBuf> {
        self.run_dir.as_ref().map(|d| d.join(&self.input_dir))
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.run_dir.as_ref().map(|d| d.join(&self.output_dir))
    }

    pub fn input_path(&self) -> Option<PathBuf> {
        self.input_dir().map(|d| d.join(&self.input_file))
    }

    /// Responses computed by the last `calculate`, in configuration order.
    pub fn values(&self) -> &[(String, f64)] {
        &self.values
    }

    fn expanded_args(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<String>> {
        let paths = HashMap::from([
            ("input_dir".to_string(), input_dir.display().to_string()),
            ("output_dir".to_string(), output_dir.display().to_string()),
            (
                "input_file".to_string(),
                input_dir.join(&self.input_file).display().to_string(),
            ),
        ]);
        self.args
            .iter()
            .map(|arg| substitute(arg, &paths).map_err(RunError::from))
            .collect()
    }
}

impl Plugin for ModelPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(
        &mut self,
        config: &ExperimentConfig,
        params: &ParametersFile,
        run_dir: &Path,
    ) -> Result<()> {
        let responses = &config.responses;
        if responses.response_files.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "the {} plugin needs response_files to compute responses from",
                self.name
            ))
            .into());
        }
        let statistics = responses.statistics()?;
        self.responses = responses
            .descriptors
            .iter()
            .zip(&responses.response_files)
            .zip(statistics)
            .map(|((descriptor, file), statistic)| ResponseSource {
                descriptor: descriptor.clone(),
                file: file.clone(),
                statistic,
            })
            .collect();

        let template = config.template_file.as_deref().ok_or_else(|| {
            Error::InvalidConfig(format!("the {} plugin needs a template_file", self.name))
        })?;

        let input_dir = run_dir.join(&self.input_dir);
        let output_dir = run_dir.join(&self.output_dir);
        for dir in [&input_dir, &output_dir] {
            fs::create_dir_all(dir).map_err(RunError::io(dir))?;
        }

        let text = fs::read_to_string(template).map_err(RunError::io(template))?;
        let input = substitute(&text, &params.values())?;
        let input_path = input_dir.join(&self.input_file);
        fs::write(&input_path, input).map_err(RunError::io(&input_path))?;
        debug!(path = %input_path.display(), "wrote model input file");

        for (idx, source) in config.auxiliary_files.iter().enumerate() {
            let name = match self.auxiliary_names.get(idx) {
                Some(name) => PathBuf::from(name),
                None => match source.file_name() {
                    Some(name) => PathBuf::from(name),
                    None => {
                        warn!(path = %source.display(), "skipping auxiliary file without a name");
                        continue;
                    }
                },
            };
            let target = input_dir.join(name);
            fs::copy(source, &target).map_err(RunError::io(source))?;
        }

        self.run_dir = Some(run_dir.to_path_buf());
        Ok(())
    }

    fn call(&mut self) -> Result<bool> {
        let (Some(run_dir), Some(input_dir), Some(output_dir)) =
            (self.run_dir.clone(), self.input_dir(), self.output_dir())
        else {
            warn!(plugin = %self.name, "model called before setup");
            return Ok(false);
        };
        if !input_dir.is_dir() || !output_dir.is_dir() {
            warn!(plugin = %self.name, "model input or output directory missing");
            return Ok(false);
        }

        let args = self.expanded_args(&input_dir, &output_dir)?;
        info!(program = %self.executable, ?args, "running model");
        let output = Command::new(&self.executable)
            .args(&args)
            .current_dir(&run_dir)
            .output()
            .map_err(|source| RunError::Spawn {
                program: self.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RunError::Process {
                program: self.executable.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(true)
    }

    fn load(&self, path: &Path) -> Result<Option<Vec<f64>>> {
        files::load_series(path, self.header_lines)
    }

    fn calculate(&mut self) -> Result<()> {
        let output_dir = self.output_dir().ok_or_else(|| {
            Error::InvalidConfig(format!("the {} plugin has not been set up", self.name))
        })?;

        let mut values = Vec::with_capacity(self.responses.len());
        for source in &self.responses {
            let path = output_dir.join(&source.file);
            let series = self.load(&path)?.ok_or(RunError::MissingOutput(path))?;
            let value = source.statistic.compute(&series)?;
            debug!(
                response = %source.descriptor,
                statistic = source.statistic.as_str(),
                value,
                "computed response"
            );
            values.push((source.descriptor.clone(), value));
        }
        self.values = values;
        Ok(())
    }

    fn write(&self, params: &ParametersFile, results_path: &Path) -> Result<()> {
        let labels = params.response_descriptors();
        let values = labels
            .iter()
            .map(|label| {
                self.values
                    .iter()
                    .find(|(descriptor, _)| descriptor == label)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| RunError::MissingResponse(label.to_string()))
            })
            .collect::<Result<Vec<f64>>>()?;
        files::write_results(results_path, &values, &labels)
    }
}
