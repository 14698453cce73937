use anyhow::{Context, Result};
use capacity_forecast::{
    DataLoader, ForecastAssembler, ForecastConfig, ForecastRecord, ForecastStore,
    InMemoryForecastStore,
};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Forecast when backup repositories will run out of capacity
#[derive(Debug, Parser)]
#[command(name = "capacity_report", version, about)]
struct Cli {
    /// CSV of daily readings: repository_id,date,used_space_gb,dedup_ratio
    #[arg(long)]
    history: PathBuf,

    /// CSV of current readings: repository_id,repository_name,repository_type,total_capacity_gb,used_space_gb
    #[arg(long)]
    snapshots: PathBuf,

    /// TOML configuration file
    #[arg(long, env = "CAPACITY_FORECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Forecast date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Write JSON records here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ForecastConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ForecastConfig::default(),
    }
    .with_env_overrides()?;
    let assembler = ForecastAssembler::new(config).context("invalid configuration")?;

    let history = DataLoader::history_from_csv(&cli.history)
        .with_context(|| format!("reading {}", cli.history.display()))?;
    let snapshots = DataLoader::snapshots_from_csv(&cli.snapshots)
        .with_context(|| format!("reading {}", cli.snapshots.display()))?;
    let inputs = DataLoader::group_inputs(snapshots, history);

    let as_of = cli.as_of.unwrap_or_else(|| Utc::now().date_naive());
    tracing::info!(repositories = inputs.len(), %as_of, "starting capacity forecast");

    let report = assembler.forecast_all(&inputs, as_of);
    for skipped in &report.skipped {
        tracing::info!(repository_id = %skipped.repository_id, reason = %skipped.reason, "skipped");
    }

    let mut store = InMemoryForecastStore::new();
    for forecast in &report.forecasts {
        store.upsert(ForecastRecord::from(forecast))?;
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            store
                .write_json(BufWriter::new(file))
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => store.write_json(std::io::stdout().lock())?,
    }

    tracing::info!(
        written = store.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "forecast records written"
    );
    Ok(())
}
