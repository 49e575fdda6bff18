//! Synthetic measurement files for exercising the engine.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::{Error, Result};
use crate::progress::throughput;
use crate::reader::DEFAULT_BUFFER_SIZE;

pub const STATIONS: [&str; 20] = [
    "Hamburg", "Berlin", "Munich", "Cologne", "Frankfurt",
    "Stuttgart", "Düsseldorf", "Leipzig", "Dortmund", "Essen",
    "Bremen", "Dresden", "Hanover", "Nuremberg", "Duisburg",
    "Bochum", "Wuppertal", "Bielefeld", "Bonn", "Münster",
];

pub const MIN_TEMPERATURE: f64 = -30.0;
pub const MAX_TEMPERATURE: f64 = 45.0;

const PROGRESS_ROWS: u64 = 10_000_000;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub rows: u64,
    pub output_dir: PathBuf,
    /// Fixed seed for reproducible files; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    pub fn new(rows: u64) -> Self {
        Self {
            rows,
            output_dir: PathBuf::from("data"),
            seed: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 {
            return Err(Error::InvalidConfig(
                "number of rows must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<dir>/measurements_<rows>_<YYYYMMDD_HHMMSS>.csv`
pub fn output_path(dir: &Path, rows: u64, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("measurements_{}_{}.csv", rows, at.format("%Y%m%d_%H%M%S")))
}

/// A temperature in the reference range with one fractional digit.
pub fn sample_temperature<R: Rng>(rng: &mut R) -> f64 {
    let raw = rng.gen_range(MIN_TEMPERATURE..=MAX_TEMPERATURE);
    (raw * 10.0).round() / 10.0
}

/// Writes `rows` random `<station>;<temperature>` lines to `out`.
pub fn write_measurements<W: Write, R: Rng>(mut out: W, rows: u64, rng: &mut R) -> io::Result<()> {
    let start = Instant::now();
    for i in 1..=rows {
        let station = STATIONS[rng.gen_range(0..STATIONS.len())];
        writeln!(out, "{};{:.1}", station, sample_temperature(rng))?;
        if i % PROGRESS_ROWS == 0 {
            info!(
                rows = i,
                "Progress: {:.2}% ({} rows, {:.2} rows/s)",
                i as f64 / rows as f64 * 100.0,
                i,
                throughput(i, start.elapsed())
            );
        }
    }
    out.flush()
}

/// Creates the output directory and file, fills it, and returns its path.
pub fn generate(config: &GeneratorConfig) -> Result<PathBuf> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir).map_err(|source| Error::Create {
        path: config.output_dir.clone(),
        source,
    })?;
    let path = output_path(&config.output_dir, config.rows, Local::now());
    let file = File::create(&path).map_err(|source| Error::Create {
        path: path.clone(),
        source,
    })?;

    info!("Generating {} rows of weather data...", config.rows);
    let start = Instant::now();
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let out = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
    write_measurements(out, config.rows, &mut rng).map_err(Error::Write)?;
    info!(
        path = %path.display(),
        "Done! Generated {} rows in {:.2} seconds.",
        config.rows,
        start.elapsed().as_secs_f64()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn temperatures_stay_in_range_with_one_decimal() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let t = sample_temperature(&mut rng);
            assert!((MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&t), "{t}");
            assert!(((t * 10.0).round() - t * 10.0).abs() < 1e-9, "{t}");
        }
    }

    #[test]
    fn writes_requested_number_of_lines() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut out = Vec::new();
        write_measurements(&mut out, 250, &mut rng).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 250);
        for line in text.lines() {
            let (station, value) = line.split_once(';').unwrap();
            assert!(STATIONS.contains(&station));
            assert!(value.parse::<f64>().is_ok());
        }
    }

    #[test]
    fn same_seed_same_output() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_measurements(&mut a, 100, &mut StdRng::seed_from_u64(42)).unwrap();
        write_measurements(&mut b, 100, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn output_path_has_rows_and_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = output_path(Path::new("data"), 1000, at);
        assert_eq!(path, Path::new("data/measurements_1000_20240309_070501.csv"));
    }

    #[test]
    fn zero_rows_is_invalid() {
        assert!(matches!(GeneratorConfig::new(0).validate(), Err(Error::InvalidConfig(_))));
        assert!(GeneratorConfig::new(1).validate().is_ok());
    }
}
