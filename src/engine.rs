//! Sequential aggregation engine.
//!
//! Drives [`StreamReader`] → [`parse_record`] → [`AggregationTable`] over a
//! single pass of the input. The memory-mapped, multi-threaded variant lives in
//! [`crate::parallel`] and is selected by [`EngineConfig::threads`].

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::parallel;
use crate::parser::parse_record;
use crate::progress::{throughput, ProgressTracker};
use crate::reader::StreamReader;
use crate::report::Report;
use crate::table::AggregationTable;

/// Shared flag used to abort a run between lines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Reading,
    Draining,
    Reporting,
    Done,
    Failed,
}

/// Result of one completed pass, before rendering.
#[derive(Debug)]
pub struct RunSummary {
    pub table: AggregationTable,
    /// Successfully parsed lines.
    pub lines: u64,
    /// Malformed lines that were skipped.
    pub skipped: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn throughput(&self) -> f64 {
        throughput(self.lines, self.elapsed)
    }
}

pub struct Engine {
    config: EngineConfig,
    cancel: CancelToken,
    state: EngineState,
}

impl Engine {
    /// Validates `config` before any input is touched.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
            state: EngineState::Idle,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// A handle that aborts the current or next run when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn transition(&mut self, next: EngineState) {
        debug!(from = ?self.state, to = ?next, "engine state");
        self.state = next;
    }

    /// Aggregates the file at `path` and builds the sorted report.
    pub fn run(&mut self, path: &Path) -> Result<Report> {
        let summary = self.aggregate_path(path)?;
        Ok(self.finish(summary))
    }

    /// Aggregates any byte stream and builds the sorted report.
    pub fn run_reader<R: Read>(&mut self, input: R) -> Result<Report> {
        let summary = self.aggregate_reader(input)?;
        Ok(self.finish(summary))
    }

    fn finish(&mut self, summary: RunSummary) -> Report {
        self.transition(EngineState::Reporting);
        let report = Report::build(&summary);
        self.transition(EngineState::Done);
        report
    }

    /// Runs the aggregation pass over a file, using the parallel engine when
    /// `threads > 0` and `path` is a regular file. Pipes and other
    /// non-regular inputs are always streamed.
    pub fn aggregate_path(&mut self, path: &Path) -> Result<RunSummary> {
        if self.config.threads > 0 && is_regular_file(path) {
            self.transition(EngineState::Reading);
            let result = parallel::aggregate(path, &self.config, &self.cancel);
            return self.complete(result);
        }
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        });
        match file {
            Ok(file) => self.aggregate_reader(file),
            Err(e) => {
                self.transition(EngineState::Failed);
                Err(e)
            }
        }
    }

    pub fn aggregate_reader<R: Read>(&mut self, input: R) -> Result<RunSummary> {
        self.transition(EngineState::Reading);
        let result = aggregate_stream(input, &self.config, &self.cancel);
        self.complete(result)
    }

    fn complete(&mut self, result: Result<RunSummary>) -> Result<RunSummary> {
        match result {
            Ok(summary) => {
                self.transition(EngineState::Draining);
                info!(
                    lines = summary.lines,
                    stations = summary.table.len(),
                    "Aggregated {} lines in {:.2} seconds ({:.2} lines/s)",
                    summary.lines,
                    summary.elapsed.as_secs_f64(),
                    summary.throughput()
                );
                if summary.skipped > 0 {
                    warn!(skipped = summary.skipped, "skipped malformed lines");
                }
                Ok(summary)
            }
            Err(e) => {
                self.transition(EngineState::Failed);
                Err(e)
            }
        }
    }
}

fn is_regular_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => true,
        Ok(_) => {
            debug!(path = %path.display(), "not a regular file, streaming sequentially");
            false
        }
        // let the sequential path report the open error
        Err(_) => false,
    }
}

fn aggregate_stream<R: Read>(
    input: R,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut reader = StreamReader::with_capacity(config.buffer_size, input);
    let mut table = AggregationTable::with_capacity(config.capacity_hint);
    let mut progress = ProgressTracker::new(config.progress);
    let mut skipped = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                lines: progress.lines(),
            });
        }
        let line = match reader.next_line().map_err(Error::Read)? {
            Some(line) => line,
            None => break,
        };
        match parse_record(line) {
            Ok(record) => {
                table.update(record.key, record.value);
                progress.record();
            }
            Err(err) => {
                skipped += 1;
                warn!(line = reader.line_number(), %err, "skipping malformed record");
            }
        }
    }

    Ok(RunSummary {
        table,
        lines: progress.lines(),
        skipped,
        elapsed: start.elapsed(),
    })
}
