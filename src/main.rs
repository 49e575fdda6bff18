use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use station_stats::config::{EngineConfig, ProgressPolicy};
use station_stats::reader::DEFAULT_BUFFER_SIZE;
use station_stats::table::DEFAULT_CAPACITY;
use station_stats::Engine;

/// Per-station min/mean/max over a `<station>;<value>` file.
#[derive(Parser, Debug)]
#[command(name = "station-stats", version)]
struct Cli {
    /// Measurements file to aggregate
    file: PathBuf,

    /// Read buffer size in bytes
    #[arg(long, env = "STATION_STATS_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Expected number of distinct stations
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Worker threads over a memory-mapped file (0 reads sequentially)
    #[arg(long, env = "STATION_STATS_THREADS", default_value_t = 0)]
    threads: usize,

    /// Log progress every N lines
    #[arg(long, value_name = "N", conflicts_with_all = ["progress_interval", "no_progress"])]
    progress_lines: Option<u64>,

    /// Log progress every SECS seconds
    #[arg(long, value_name = "SECS", conflicts_with = "no_progress")]
    progress_interval: Option<u64>,

    /// Do not log progress
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let progress = if self.no_progress {
            ProgressPolicy::Disabled
        } else if let Some(secs) = self.progress_interval {
            ProgressPolicy::EveryInterval(Duration::from_secs(secs))
        } else if let Some(lines) = self.progress_lines {
            ProgressPolicy::EveryLines(lines)
        } else {
            ProgressPolicy::default()
        };
        EngineConfig::default()
            .with_buffer_size(self.buffer_size)
            .with_capacity_hint(self.capacity)
            .with_threads(self.threads)
            .with_progress(progress)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine = Engine::new(cli.engine_config()).context("invalid configuration")?;

    info!("Processing file: {}", cli.file.display());
    let report = engine
        .run(&cli.file)
        .with_context(|| format!("failed to process {}", cli.file.display()))?;
    report.write_to(std::io::stdout().lock())?;
    Ok(())
}
