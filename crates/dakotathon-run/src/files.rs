//! File-level wrappers around template generation, model output loading
//! and results files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dakotathon_core::{Error, failure, format_results, merge_dakota_template, render_defaults};
use tracing::{info, warn};

use crate::error::{Result, RunError};

/// Fill every placeholder of a model template from a parameter table.
///
/// Writes `<template stem>.defaults` next to the template unless `out` is
/// given, and returns the path written.
pub fn write_defaults_file(template: &Path, parameters: &Path, out: Option<&Path>) -> Result<PathBuf> {
    let text = fs::read_to_string(template).map_err(RunError::io(template))?;
    let table = fs::read_to_string(parameters).map_err(RunError::io(parameters))?;
    let filled = render_defaults(&text, &table)?;

    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| template.with_extension("defaults"));
    fs::write(&out, filled).map_err(RunError::io(&out))?;
    info!(path = %out.display(), "wrote defaults file");
    Ok(out)
}

/// Write `<defaults stem>.dtmpl`: the defaults file with markers restored
/// for the parameters Dakota varies.
pub fn write_dtmpl_file(template: &Path, defaults: &Path, names: &[&str]) -> Result<PathBuf> {
    let text = fs::read_to_string(template).map_err(RunError::io(template))?;
    let dflt = fs::read_to_string(defaults).map_err(RunError::io(defaults))?;
    let merged = merge_dakota_template(&text, &dflt, names)?;

    let out = defaults.with_extension("dtmpl");
    fs::write(&out, merged).map_err(RunError::io(&out))?;
    info!(path = %out.display(), parameters = names.len(), "wrote Dakota template");
    Ok(out)
}

/// Read a whitespace-separated numeric model output file as one series,
/// skipping `header_lines` leading lines. `Ok(None)` if the file does not
/// exist.
pub fn load_series(path: &Path, header_lines: usize) -> Result<Option<Vec<f64>>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "model output file not found");
            return Ok(None);
        }
        Err(e) => return Err(RunError::io(path)(e)),
    };

    let mut series = Vec::new();
    for (idx, line) in text.lines().enumerate().skip(header_lines) {
        for field in line.split_whitespace() {
            let value = field.parse::<f64>().map_err(|_| {
                RunError::Core(Error::Parse {
                    line: idx + 1,
                    message: format!("'{field}' is not a number in {}", path.display()),
                })
            })?;
            series.push(value);
        }
    }
    Ok(Some(series))
}

pub fn write_results(path: &Path, values: &[f64], labels: &[&str]) -> Result<()> {
    let text = format_results(values, labels)?;
    fs::write(path, text).map_err(RunError::io(path))?;
    info!(path = %path.display(), responses = values.len(), "wrote results file");
    Ok(())
}

/// Mark the evaluation failed for Dakota's failure capture.
pub fn write_failure(path: &Path) -> Result<()> {
    fs::write(path, failure()).map_err(RunError::io(path))?;
    warn!(path = %path.display(), "wrote failed results file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_load_series_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HYDROASCII.QS");
        fs::write(&path, "h1\nh2\n0\n1\n2\n").unwrap();

        let series = load_series(&path, 2).unwrap().unwrap();
        assert_eq!(series, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_load_series_flattens_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "1.5 2.5\n\n3.5e1\n").unwrap();

        let series = load_series(&path, 0).unwrap().unwrap();
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[2], 35.0);
    }

    #[test]
    fn test_load_series_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_series(&dir.path().join("vfnqeubnuen.f"), 0).unwrap(), None);
    }

    #[test]
    fn test_load_series_bad_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "header\n1.0 n/a\n").unwrap();

        let err = load_series(&path, 1).unwrap_err();
        assert!(matches!(err, RunError::Core(Error::Parse { line: 2, .. })));
    }

    #[test]
    fn test_defaults_then_dtmpl_files() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("hydrotrend.in.tmpl");
        let parameters = dir.path().join("parameters.yaml");
        fs::write(&template, "title\n{T} {dT} )Temp\n{P} )Precip\n").unwrap();
        fs::write(
            &parameters,
            "T:\n  value: {default: 14.26}\ndT:\n  value: {default: 0.0}\nP: 1.59\n",
        )
        .unwrap();

        let defaults = write_defaults_file(&template, &parameters, None).unwrap();
        assert_eq!(defaults, dir.path().join("hydrotrend.in.defaults"));
        assert_eq!(
            fs::read_to_string(&defaults).unwrap(),
            "title\n14.26 0.0 )Temp\n1.59 )Precip\n"
        );

        let dtmpl = write_dtmpl_file(&template, &defaults, &["T"]).unwrap();
        assert_eq!(dtmpl, dir.path().join("hydrotrend.in.dtmpl"));
        assert_eq!(
            fs::read_to_string(&dtmpl).unwrap(),
            "title\n{T} 0.0 )Temp\n1.59 )Precip\n"
        );
    }

    #[test]
    fn test_results_and_failure_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.out");

        write_results(&path, &[1.0, 2.0], &["Qs_median", "Q_mean"]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1.0\tQs_median\n2.0\tQ_mean\n"
        );

        write_failure(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "FAIL\n");
    }
}
