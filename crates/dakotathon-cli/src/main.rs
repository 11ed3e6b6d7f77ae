use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use dakotathon_core::{
    DEFAULT_DATA_FILE, DEFAULT_OUTPUT_FILE, DakotaOutput, MethodKind, TabularData,
};
use dakotathon_run::config_file::find_config;
use dakotathon_run::dakota::dakota_exe;
use dakotathon_run::files::{write_defaults_file, write_dtmpl_file};
use dakotathon_run::{Dakota, DakotaResults, check_status, run_plugin, which};

#[derive(Parser)]
#[command(name = "dakotathon", about = "Configure, run and drive Dakota experiments")]
struct Cli {
    /// Directory Dakota runs in (default: the configuration's run_directory)
    #[arg(long, global = true)]
    run_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the Dakota input file and pinned configuration
    Write {
        /// Experiment configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use this method's default Rosenbrock study
        #[arg(long, conflicts_with = "config")]
        method: Option<MethodKind>,
    },

    /// Set up and run Dakota, then summarize its results
    Run {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, conflicts_with = "config")]
        method: Option<MethodKind>,

        /// Stop Dakota after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Analysis driver: evaluate the configured plugin for one parameters file
    RunPlugin {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parameters file written by Dakota
        params: PathBuf,

        /// Results file Dakota reads back
        results: PathBuf,
    },

    /// Parse Dakota's output and tabular data files
    Parse {
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        data: Option<PathBuf>,

        /// Print JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },

    /// Report whether the Dakota executable can be found
    Check,

    /// Fill a model template from a parameter table's defaults
    Defaults {
        template: PathBuf,

        parameters: PathBuf,

        /// Output path (default: <template stem>.defaults)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a Dakota template that varies only the named parameters
    Dtmpl {
        template: PathBuf,

        defaults: PathBuf,

        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Write { config, method } => cmd_write(&cli, config.as_deref(), *method),
        Commands::Run {
            config,
            method,
            timeout,
        } => cmd_run(&cli, config.as_deref(), *method, *timeout).await,
        Commands::RunPlugin {
            config,
            params,
            results,
        } => run_plugin(params, results, config.as_deref())
            .with_context(|| format!("evaluation of {} failed", params.display())),
        Commands::Parse { output, data, json } => {
            cmd_parse(&cli, output.as_deref(), data.as_deref(), *json)
        }
        Commands::Check => cmd_check(),
        Commands::Defaults {
            template,
            parameters,
            output,
        } => {
            let path = write_defaults_file(template, parameters, output.as_deref())
                .context("failed to write defaults file")?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Dtmpl {
            template,
            defaults,
            names,
        } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let path = write_dtmpl_file(template, defaults, &names)
                .context("failed to write Dakota template")?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Pick the experiment: an explicit file, a method's defaults, or the
/// nearest `dakota.yaml`; vector_parameter_study defaults as a last resort.
fn open_dakota(cli: &Cli, config: Option<&Path>, method: Option<MethodKind>) -> Result<Dakota> {
    let dakota = match (config, method) {
        (Some(path), _) => Dakota::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        (None, Some(kind)) => Dakota::default_for(kind),
        (None, None) => {
            let start = match &cli.run_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().context("failed to read current directory")?,
            };
            match find_config(&start) {
                Some(path) => Dakota::from_file(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => Dakota::default_for(MethodKind::VectorParameterStudy),
            }
        }
    };
    Ok(match &cli.run_dir {
        Some(dir) => dakota.with_run_directory(dir.clone()),
        None => dakota,
    })
}

fn cmd_write(cli: &Cli, config: Option<&Path>, method: Option<MethodKind>) -> Result<()> {
    let mut dakota = open_dakota(cli, config, method)?;
    let input = dakota.setup().context("failed to set up experiment")?;
    println!("{}", input.display());
    Ok(())
}

async fn cmd_run(
    cli: &Cli,
    config: Option<&Path>,
    method: Option<MethodKind>,
    timeout: Option<u64>,
) -> Result<()> {
    let mut dakota = open_dakota(cli, config, method)?;
    dakota.setup().context("failed to set up experiment")?;

    let program = dakota.program();
    let mut cmd = tokio::process::Command::from(dakota.command());
    cmd.kill_on_drop(true)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let child = cmd
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    tracing::info!(
        "running {program} in {}",
        dakota.run_directory().display()
    );

    let output = tokio::select! {
        result = wait_for(child.wait_with_output(), timeout.map(Duration::from_secs)) => result?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted; {program} was stopped"),
    };
    check_status(&program, &output)?;

    let results = dakota.results().context("failed to read Dakota results")?;
    print_summary(&results);
    Ok(())
}

async fn wait_for(
    wait: impl Future<Output = io::Result<Output>>,
    limit: Option<Duration>,
) -> Result<Output> {
    let output = match limit {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| anyhow!("Dakota timed out after {}s and was stopped", limit.as_secs()))?,
        None => wait.await,
    };
    output.context("failed waiting for Dakota")
}

fn cmd_parse(cli: &Cli, output: Option<&Path>, data: Option<&Path>, json: bool) -> Result<()> {
    let run_dir = cli.run_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| run_dir.join(DEFAULT_OUTPUT_FILE));
    let data_path = data
        .map(Path::to_path_buf)
        .unwrap_or_else(|| run_dir.join(DEFAULT_DATA_FILE));

    let mut results = DakotaResults::default();
    if output_path.is_file() {
        let text = std::fs::read_to_string(&output_path)
            .with_context(|| format!("failed to read {}", output_path.display()))?;
        results.output = Some(DakotaOutput::parse(&text));
    }
    if data_path.is_file() {
        let text = std::fs::read_to_string(&data_path)
            .with_context(|| format!("failed to read {}", data_path.display()))?;
        results.data = Some(
            TabularData::parse(&text)
                .with_context(|| format!("failed to parse {}", data_path.display()))?,
        );
    }
    if results.output.is_none() && results.data.is_none() {
        bail!(
            "neither {} nor {} exists",
            output_path.display(),
            data_path.display()
        );
    }

    if json {
        let text = serde_json::to_string_pretty(&results).context("failed to serialize results")?;
        println!("{text}");
    } else {
        print_summary(&results);
    }
    Ok(())
}

fn cmd_check() -> Result<()> {
    let program = dakota_exe();
    match which(&program) {
        Some(path) => {
            println!("dakota: {}", path.display());
            Ok(())
        }
        None => bail!("{program} not found on PATH (set DAKOTA_EXE to use another executable)"),
    }
}

fn print_summary(results: &DakotaResults) {
    if let Some(output) = &results.output {
        if let Some(n) = output.evaluations {
            println!("evaluations: {n}");
        }
        println!("completed:   {}", output.completed);
        for m in &output.moments {
            let mut line = format!("{}: mean={} std_dev={}", m.descriptor, m.mean, m.std_dev);
            if let Some(skewness) = m.skewness {
                line.push_str(&format!(" skewness={skewness}"));
            }
            if let Some(kurtosis) = m.kurtosis {
                line.push_str(&format!(" kurtosis={kurtosis}"));
            }
            println!("{line}");
        }
        for s in &output.sobol {
            println!(
                "{} / {}: main={} total={}",
                s.response, s.variable, s.main, s.total
            );
        }
    }
    if let Some(data) = &results.data {
        println!(
            "tabular data: {} rows [{}]",
            data.len(),
            data.columns.join(" ")
        );
    }
}
