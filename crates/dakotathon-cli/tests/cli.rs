//! CLI command integration tests.
//! Each test works in its own temp directory; Dakota and the model are
//! stand-in shell scripts selected through DAKOTA_EXE and the config.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dakotathon(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("dakotathon").unwrap();
    cmd.current_dir(dir.path())
        .env("DAKOTA_EXE", dir.path().join("no-dakota-here"))
        .env_remove("DAKOTATHON_EXE")
        .env_remove("RUST_LOG");
    cmd
}

#[cfg(unix)]
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

const SAMPLING_OUT: &str = "\
<<<<< Function evaluation summary: 5 total (5 new, 0 duplicate)
Sample moment statistics for each response function:
                            Mean           Std Dev          Skewness          Kurtosis
            y1  2.5000000000e+00  1.0000000000e+00  0.0000000000e+00  -1.2000000000e+00

<<<<< Iterator sampling completed.
";

#[test]
fn write_default_method() {
    let dir = TempDir::new().unwrap();
    let study = dir.path().join("study");

    dakotathon(&dir)
        .args(["write", "--method", "sampling", "--run-dir"])
        .arg(&study)
        .assert()
        .success()
        .stdout(predicate::str::contains("dakota.in"));

    let input = fs::read_to_string(study.join("dakota.in")).unwrap();
    assert!(input.contains("  sampling\n"));
    assert!(input.contains("uniform_uncertain = 2"));
    assert!(study.join("dakota.yaml").is_file());
}

#[test]
fn write_unknown_method_fails() {
    let dir = TempDir::new().unwrap();
    dakotathon(&dir)
        .args(["write", "--method", "annealing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("annealing"));
}

#[test]
fn write_from_found_config_pins_driver() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("HYDRO.IN.dtmpl"), "{T}\n").unwrap();
    fs::write(
        dir.path().join("dakota.yaml"),
        "\
run_directory: study
template_file: HYDRO.IN.dtmpl
plugin: hydrotrend
method: centered_parameter_study
variables:
  kind: continuous_design
  descriptors: [T, P]
responses:
  descriptors: [Qs_median]
  response_files: [HYDROASCII.QS]
  response_statistics: [median]
",
    )
    .unwrap();

    dakotathon(&dir).arg("write").assert().success();

    let study = dir.path().join("study");
    let input = fs::read_to_string(study.join("dakota.in")).unwrap();
    let pinned = format!(
        "analysis_drivers = 'dakotathon run-plugin --config {}'",
        study.join("dakota.yaml").display()
    );
    assert!(input.contains(&pinned), "{input}");
    assert!(study.join("HYDRO.IN.dtmpl").is_file());
}

#[test]
fn check_without_dakota() {
    let dir = TempDir::new().unwrap();
    dakotathon(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[cfg(unix)]
#[test]
fn check_with_dakota() {
    let dir = TempDir::new().unwrap();
    let fake = script(dir.path(), "dakota", "exit 0\n");
    dakotathon(&dir)
        .env("DAKOTA_EXE", &fake)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains(fake.display().to_string()));
}

#[cfg(unix)]
#[test]
fn run_prints_summary() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("canned.out"), SAMPLING_OUT).unwrap();
    let fake = script(
        dir.path(),
        "fake-dakota",
        &format!("cp {} \"$4\"\n", dir.path().join("canned.out").display()),
    );

    dakotathon(&dir)
        .env("DAKOTA_EXE", &fake)
        .args(["run", "--method", "sampling", "--run-dir", "study"])
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluations: 5"))
        .stdout(predicate::str::contains("y1: mean=2.5"));
}

#[cfg(unix)]
#[test]
fn run_reports_dakota_failure() {
    let dir = TempDir::new().unwrap();
    let fake = script(dir.path(), "fake-dakota", "echo 'Input error' >&2\nexit 3\n");

    dakotathon(&dir)
        .env("DAKOTA_EXE", &fake)
        .args(["run", "--method", "sampling"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input error"));
}

#[cfg(unix)]
#[test]
fn run_timeout_stops_dakota() {
    let dir = TempDir::new().unwrap();
    let fake = script(dir.path(), "fake-dakota", "sleep 30\n");

    dakotathon(&dir)
        .env("DAKOTA_EXE", &fake)
        .args(["run", "--method", "sampling", "--timeout", "1"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn parse_json() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dakota.out"), SAMPLING_OUT).unwrap();
    fs::write(
        dir.path().join("dakota.dat"),
        "%eval_id interface x1 x2 y1\n1 NO_ID 0.5 0.5 2.5\n",
    )
    .unwrap();

    let output = dakotathon(&dir).args(["parse", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["output"]["evaluations"], 5);
    assert_eq!(json["output"]["moments"][0]["descriptor"], "y1");
    assert_eq!(json["data"]["columns"][2], "y1");
}

#[test]
fn parse_without_files_fails() {
    let dir = TempDir::new().unwrap();
    dakotathon(&dir)
        .arg("parse")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dakota.out"));
}

#[test]
fn defaults_then_dtmpl() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("hydrotrend.in.tmpl"),
        "title\n{T} {dT} )Temperature\n{P} )Precipitation\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("parameters.yaml"),
        "T: {value: {default: 14.26}}\ndT: {value: {default: 0.0}}\nP: {value: {default: 1.59}}\n",
    )
    .unwrap();

    dakotathon(&dir)
        .args(["defaults", "hydrotrend.in.tmpl", "parameters.yaml", "-o", "HYDRO.IN.defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HYDRO.IN.defaults"));

    dakotathon(&dir)
        .args(["dtmpl", "hydrotrend.in.tmpl", "HYDRO.IN.defaults", "T", "P"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HYDRO.IN.dtmpl"));

    assert_eq!(
        fs::read_to_string(dir.path().join("HYDRO.IN.dtmpl")).unwrap(),
        "title\n{T} 0.0 )Temperature\n{P} )Precipitation\n"
    );
}

#[cfg(unix)]
#[test]
fn run_plugin_evaluates_model() {
    let dir = TempDir::new().unwrap();
    let model = script(dir.path(), "model.sh", "cp \"$1\" \"$2/y.txt\"\n");
    fs::write(dir.path().join("model.in.dtmpl"), "{x1} {x2}\n").unwrap();
    fs::write(
        dir.path().join("dakota.yaml"),
        format!(
            "\
template_file: model.in.dtmpl
plugin:
  name: model
  executable: {}
  args: ['{{input_file}}', '{{output_dir}}']
method: sampling
responses:
  descriptors: [y1]
  response_files: [y.txt]
  response_statistics: [sum]
",
            model.display()
        ),
    )
    .unwrap();

    let work = dir.path().join("run").join("run.1");
    fs::create_dir_all(&work).unwrap();
    fs::write(
        work.join("params.in"),
        "2 variables\n1.0e+00 x1\n2.5e+00 x2\n1 functions\n1 ASV_1:y1\n0 derivative_variables\n0 analysis_components\n1 eval_id\n",
    )
    .unwrap();

    // Found by searching upward from the evaluation directory.
    #[allow(deprecated)]
    Command::cargo_bin("dakotathon")
        .unwrap()
        .current_dir(&work)
        .args(["run-plugin", "params.in", "results.out"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(work.join("results.out")).unwrap(),
        "3.5\ty1\n"
    );
}

#[test]
fn run_plugin_failure_writes_fail() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("params.in"), "garbage\n").unwrap();

    dakotathon(&dir)
        .args(["run-plugin", "params.in", "results.out"])
        .assert()
        .failure();

    assert_eq!(
        fs::read_to_string(dir.path().join("results.out")).unwrap(),
        "FAIL\n"
    );
}
