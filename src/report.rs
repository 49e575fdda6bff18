use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::engine::RunSummary;
use crate::error::{Error, Result};
use crate::progress::throughput;
use crate::table::AggregationTable;

const RULE_WIDTH: usize = 41;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub station: String,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u64,
}

/// Final per-station results, sorted by station bytes.
///
/// Stations that are not valid UTF-8 are rendered with their bytes escaped
/// (`\xff`), so distinct keys never print as the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    rows: Vec<ReportRow>,
    total_rows: u64,
    skipped: u64,
    elapsed: Duration,
}

impl Report {
    pub fn build(summary: &RunSummary) -> Self {
        let mut report = Self::from_table(&summary.table, summary.elapsed);
        report.skipped = summary.skipped;
        report
    }

    pub fn from_table(table: &AggregationTable, elapsed: Duration) -> Self {
        let mut entries = table.iter().collect::<Vec<_>>();
        entries.sort_unstable_by_key(|(key, _)| *key);
        let rows = entries
            .into_iter()
            .map(|(key, stats)| ReportRow {
                station: station_name(key),
                min: stats.min,
                mean: stats.mean(),
                max: stats.max,
                count: stats.count,
            })
            .collect::<Vec<_>>();
        let total_rows = rows.iter().map(|row| row.count).sum();
        Self {
            rows,
            total_rows,
            skipped: 0,
            elapsed,
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Sum of counts across all stations.
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn rows_per_second(&self) -> f64 {
        throughput(self.total_rows, self.elapsed)
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        write!(out, "{}", self).map_err(Error::Write)?;
        out.flush().map_err(Error::Write)
    }
}

fn station_name(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(name) => name.to_string(),
        Err(_) => key.escape_ascii().to_string(),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        writeln!(f, "{:<15} {:>8} {:>8} {:>8}", "Station", "Min", "Mean", "Max")?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<15} {:>8.1} {:>8.1} {:>8.1}",
                row.station, row.min, row.mean, row.max
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Processed {} rows in {:.2} seconds ({:.2} rows/s)",
            self.total_rows,
            self.elapsed.as_secs_f64(),
            self.rows_per_second()
        )
    }
}
