use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use station_stats::generator::{generate, GeneratorConfig};

/// Writes a random measurements file for the aggregator.
#[derive(Parser, Debug)]
#[command(name = "generate", version)]
struct Cli {
    /// Number of rows to generate
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    rows: u64,

    /// Directory the file is written to
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Seed for a reproducible file
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = GeneratorConfig::new(cli.rows).with_output_dir(cli.output_dir);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let path = generate(&config).context("failed to generate measurements")?;
    println!("{}", path.display());
    Ok(())
}
