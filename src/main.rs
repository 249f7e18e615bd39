//! Reactor - elemental reaction and damage simulator
//!
//! Loads TOML scenarios, runs each in its own simulation on a worker pool,
//! and writes a JSON report.

mod batch;
mod report;
mod scenario;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use batch::{run_batch, WorkerPool};
use report::{default_report_path, BatchReport};
use scenario::Scenario;
use settings::EngineSettings;

/// Elemental reaction and damage simulator
#[derive(Parser, Debug)]
#[command(name = "reactor")]
#[command(about = "Elemental reaction and damage simulator")]
#[command(version)]
struct Cli {
    /// Log filter, overriding the settings file (RUST_LOG wins over both)
    #[arg(long, global = true, value_name = "FILTER")]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one or more scenarios and report the results
    Run {
        /// Scenario files
        #[arg(required = true, value_name = "SCENARIO")]
        scenarios: Vec<PathBuf>,

        /// Worker threads (0 = one per core)
        #[arg(long, short)]
        workers: Option<usize>,

        /// Write the JSON report here
        #[arg(long, short, value_name = "OUTPUT_PATH")]
        output: Option<PathBuf>,
    },
    /// Parse a scenario and print it back out
    Inspect {
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,
    },
    /// Write the current settings (or the defaults) to the settings file
    InitSettings,
}

fn init_logging(settings: &EngineSettings, cli_filter: Option<&str>) {
    let fallback = cli_filter.unwrap_or(&settings.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(settings.logging.show_target)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (settings, note) = EngineSettings::load();
    init_logging(&settings, cli.log.as_deref());
    EngineSettings::report(note);

    match cli.command {
        Command::Run {
            scenarios,
            workers,
            output,
        } => run(&settings, &scenarios, workers, output),
        Command::Inspect { scenario } => inspect(&scenario),
        Command::InitSettings => settings.save(),
    }
}

fn run(
    settings: &EngineSettings,
    paths: &[PathBuf],
    workers: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let scenarios = paths
        .iter()
        .map(|path| {
            Scenario::load(path).with_context(|| format!("Failed to load {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let pool = WorkerPool::with_workers(workers.unwrap_or(settings.batch.workers));
    let reports = run_batch(&scenarios, pool, settings.simulation.duration_frames)?;
    for report in &reports {
        println!("{}", report.summary());
    }

    let report = BatchReport::new(reports);
    let path = output.or_else(|| settings.batch.report_dir.as_deref().map(default_report_path));
    if let Some(path) = path {
        report.write(&path)?;
        info!("Wrote report to {}", path.display());
    }

    let completed = report.completed();
    if completed < report.scenarios.len() {
        anyhow::bail!(
            "{} of {} scenario(s) did not complete",
            report.scenarios.len() - completed,
            report.scenarios.len()
        );
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let scenario =
        Scenario::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let text = toml::to_string_pretty(&scenario).context("Failed to render scenario")?;
    println!("{text}");
    Ok(())
}
