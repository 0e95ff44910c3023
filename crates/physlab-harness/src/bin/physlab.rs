use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use physlab_harness::{run, run_collect};
use physlab_model::{ExperimentSpec, MetricFrame, ReportStatus, SimulationReport};
use physlab_scenarios::catalog;

#[derive(Parser)]
#[command(name = "physlab", version, about = "Deterministic physics experiment harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single experiment and emit its report
    Run {
        /// Path to the experiment YAML document
        experiment: PathBuf,

        /// Report file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Baseline report to compare against
        #[arg(short, long)]
        baseline: Option<PathBuf>,

        /// Include per-frame metrics in the output
        #[arg(long)]
        frames: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Run an experiment and store its report as a baseline
    Baseline {
        /// Path to the experiment YAML document
        experiment: PathBuf,

        /// Where to write the baseline report
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run every experiment in a directory
    Suite {
        /// Directory of experiment YAML documents
        directory: PathBuf,

        /// Directory for the per-experiment reports
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Stop at the first failure or error
        #[arg(long)]
        fail_fast: bool,
    },

    /// Deserialise and validate an experiment document without simulating
    Validate {
        /// Path to the experiment YAML document
        experiment: PathBuf,
    },

    /// List builtin scenarios and their parameters
    Scenarios,
}

/// Report plus optional frame dump, for `run --frames`.
#[derive(Serialize)]
struct ExtendedReport {
    #[serde(flatten)]
    report: SimulationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<Vec<MetricFrame>>,
}

fn load_experiment(path: &Path) -> Result<ExperimentSpec> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read experiment file {}", path.display()))?;
    let spec: ExperimentSpec = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse experiment YAML {}", path.display()))?;
    Ok(spec)
}

fn load_baseline(path: &Path) -> Result<SimulationReport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read baseline file {}", path.display()))?;
    let report: SimulationReport = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse baseline JSON {}", path.display()))?;
    Ok(report)
}

fn save_json<T: Serialize>(value: &T, path: &Path, pretty: bool) -> Result<()> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn status_exit(status: ReportStatus) -> u8 {
    match status {
        ReportStatus::Passed => 0,
        ReportStatus::Failed => 1,
        ReportStatus::Error => 2,
    }
}

fn print_summary(report: &SimulationReport) {
    eprintln!();
    eprintln!("experiment : {}", report.experiment_name);
    eprintln!("status     : {:?}", report.status);
    eprintln!("steps      : {}", report.total_steps);
    eprintln!("time       : {:.3}s", report.total_time);
    if let Some(m) = &report.metrics {
        eprintln!("energy drift          : {:.3}%", m.energy_drift_percent);
        eprintln!("max penetration       : {:.6} m", m.max_penetration_ever);
        eprintln!("constraint violations : {}", m.total_constraint_violations);
        match m.stabilization_step {
            Some(step) => eprintln!("stabilised at step    : {step}"),
            None => eprintln!("stabilised at step    : never"),
        }
    }
    if let Some(e) = &report.error {
        eprintln!("error      : {e}");
    }
    if !report.criteria_results.is_empty() {
        eprintln!("criteria:");
        for (tag, r) in &report.criteria_results {
            let mark = if r.passed { "ok " } else { "FAIL" };
            match r.value {
                Some(v) => eprintln!("  [{mark}] {tag} = {v:.6}"),
                None => eprintln!("  [{mark}] {tag} = null"),
            }
        }
    }
    if let Some(cmp) = &report.baseline_comparison {
        eprintln!("baseline   : {} -> {:?}", cmp.baseline_name, cmp.recommendation);
        if !cmp.metrics_improved.is_empty() {
            eprintln!("  improved : {}", cmp.metrics_improved.join(", "));
        }
        if !cmp.metrics_regressed.is_empty() {
            eprintln!("  regressed: {}", cmp.metrics_regressed.join(", "));
        }
    }
}

fn cmd_run(
    experiment: &Path,
    output: Option<&Path>,
    baseline: Option<&Path>,
    frames: bool,
    pretty: bool,
) -> Result<u8> {
    let spec = load_experiment(experiment)?;
    let baseline_report = baseline.map(load_baseline).transpose()?;

    let (report, collected) = run_collect(&spec, baseline_report.as_ref())?;

    let extended = ExtendedReport {
        report: report.clone(),
        frames: frames.then_some(collected),
    };
    match output {
        Some(path) => {
            save_json(&extended, path, pretty)?;
            info!(path = %path.display(), "report written");
        }
        None => {
            let json = if pretty {
                serde_json::to_string_pretty(&extended)?
            } else {
                serde_json::to_string(&extended)?
            };
            println!("{json}");
        }
    }

    print_summary(&report);
    Ok(status_exit(report.status))
}

fn cmd_baseline(experiment: &Path, output: &Path) -> Result<u8> {
    let spec = load_experiment(experiment)?;
    let report = run(&spec, None)?;
    save_json(&report, output, true)?;
    info!(path = %output.display(), "baseline written");
    print_summary(&report);
    Ok(status_exit(report.status))
}

fn cmd_suite(directory: &Path, output: &Path, fail_fast: bool) -> Result<u8> {
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    let mut experiments: Vec<PathBuf> = fs::read_dir(directory)
        .with_context(|| format!("failed to read directory {}", directory.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false)
        })
        .collect();
    // stable execution order regardless of directory enumeration
    experiments.sort();

    if experiments.is_empty() {
        error!(directory = %directory.display(), "no experiment files found");
        return Ok(2);
    }

    let (mut passed, mut failed, mut errors) = (0u32, 0u32, 0u32);
    for path in &experiments {
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let outcome = load_experiment(path).and_then(|spec| {
            let report = run(&spec, None)?;
            let report_path = output.join(format!("{}.json", spec.metadata.name));
            save_json(&report, &report_path, true)?;
            Ok(report.status)
        });

        match outcome {
            Ok(ReportStatus::Passed) => {
                eprintln!("{name}: passed");
                passed += 1;
            }
            Ok(ReportStatus::Failed) => {
                eprintln!("{name}: FAILED");
                failed += 1;
                if fail_fast { break; }
            }
            Ok(ReportStatus::Error) => {
                eprintln!("{name}: ERROR");
                errors += 1;
                if fail_fast { break; }
            }
            Err(e) => {
                eprintln!("{name}: ERROR ({e:#})");
                errors += 1;
                if fail_fast { break; }
            }
        }
    }

    eprintln!();
    eprintln!("suite: {passed} passed, {failed} failed, {errors} errors of {}", experiments.len());

    Ok(if errors > 0 { 2 } else if failed > 0 { 1 } else { 0 })
}

fn cmd_validate(experiment: &Path) -> Result<u8> {
    let spec = load_experiment(experiment)?;
    match spec.validate() {
        Ok(()) => {
            eprintln!("{}: valid", experiment.display());
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}: {e}", experiment.display());
            Ok(2)
        }
    }
}

fn cmd_scenarios() -> Result<u8> {
    for info in catalog() {
        println!("{}", info.name);
        println!("    {}", info.description);
        for p in info.params {
            println!("    {:<18} default {:<10} {}", p.name, p.default, p.doc);
        }
    }
    Ok(0)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Run { experiment, output, baseline, frames, pretty } => cmd_run(
            experiment,
            output.as_deref(),
            baseline.as_deref(),
            *frames,
            *pretty,
        ),
        Commands::Baseline { experiment, output } => cmd_baseline(experiment, output),
        Commands::Suite { directory, output, fail_fast } => cmd_suite(directory, output, *fail_fast),
        Commands::Validate { experiment } => cmd_validate(experiment),
        Commands::Scenarios => cmd_scenarios(),
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
