//! Memory-mapped, multi-threaded aggregation.
//!
//! The file is split into one byte range per worker, each range starting on a
//! line boundary. Workers fill independent [`AggregationTable`]s that are
//! merged once all of them finish.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use memchr::memchr;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::{CancelToken, RunSummary};
use crate::error::{Error, Result};
use crate::parser::parse_record;
use crate::progress::SharedProgress;
use crate::table::AggregationTable;

/// Lines a worker processes before publishing them to the shared progress.
const PROGRESS_BATCH: u64 = 4096;

#[derive(Debug, Default)]
struct Partial {
    table: AggregationTable,
    lines: u64,
    skipped: u64,
}

impl Partial {
    fn merge(mut self, other: Partial) -> Partial {
        self.table.merge(other.table);
        self.lines += other.lines;
        self.skipped += other.skipped;
        self
    }
}

/// Aggregates a regular file. Anything else (FIFOs, character devices,
/// `/proc` entries) cannot be mapped and is rejected with [`Error::Open`];
/// [`crate::Engine`] streams such inputs sequentially instead.
pub fn aggregate(path: &Path, config: &EngineConfig, cancel: &CancelToken) -> Result<RunSummary> {
    let start = Instant::now();
    let open_error = |source: std::io::Error| Error::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    let metadata = file.metadata().map_err(open_error)?;
    if !metadata.is_file() {
        return Err(open_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file, cannot be memory-mapped",
        )));
    }
    if metadata.len() == 0 {
        return Ok(RunSummary {
            table: AggregationTable::with_capacity(config.capacity_hint),
            lines: 0,
            skipped: 0,
            elapsed: start.elapsed(),
        });
    }
    // The mapping is only valid while nobody truncates the file underneath us.
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(open_error)?;
    let data: &[u8] = &mmap;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("cannot start worker pool: {e}")))?;

    let progress = SharedProgress::new(config.progress);
    let bounds = chunk_bounds(data, config.threads);
    let chunks = bounds.windows(2).map(|w| (w[0], w[1])).collect::<Vec<_>>();
    let merged = pool.install(|| {
        chunks
            .into_par_iter()
            .map(|(from, to)| aggregate_chunk(&data[from..to], from, config, cancel, &progress))
            .try_reduce(Partial::default, |acc, x| Ok(acc.merge(x)))
    })?;

    Ok(RunSummary {
        table: merged.table,
        lines: merged.lines,
        skipped: merged.skipped,
        elapsed: start.elapsed(),
    })
}

/// Offsets splitting `data` into `parts` ranges, each beginning at a line start.
/// The first offset is 0 and the last is `data.len()`; neighbours may be equal.
fn chunk_bounds(data: &[u8], parts: usize) -> Vec<usize> {
    let parts = parts.max(1);
    let chunk_size = data.len() / parts;
    let mut bounds = Vec::with_capacity(parts + 1);
    bounds.push(0);
    for i in 1..parts {
        let pos = line_start_at_or_after(data, i * chunk_size);
        bounds.push(pos.max(bounds[i - 1]));
    }
    bounds.push(data.len());
    bounds
}

#[inline]
fn line_start_at_or_after(data: &[u8], position: usize) -> usize {
    if position == 0 {
        return 0;
    }
    memchr(b'\n', &data[position - 1..])
        .map(|x| position + x)
        .unwrap_or(data.len())
}

fn aggregate_chunk(
    chunk: &[u8],
    base: usize,
    config: &EngineConfig,
    cancel: &CancelToken,
    progress: &SharedProgress,
) -> Result<Partial> {
    let mut partial = Partial {
        table: AggregationTable::with_capacity(config.capacity_hint),
        ..Partial::default()
    };
    let mut rest = chunk;
    let mut offset = base;
    let mut pending = 0u64;
    while !rest.is_empty() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                lines: partial.lines,
            });
        }
        let (line, consumed) = match memchr(b'\n', rest) {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        match parse_record(line) {
            Ok(record) => {
                partial.table.update(record.key, record.value);
                partial.lines += 1;
                pending += 1;
                if pending == PROGRESS_BATCH {
                    progress.add(pending);
                    pending = 0;
                }
            }
            Err(err) => {
                partial.skipped += 1;
                warn!(offset, %err, "skipping malformed record");
            }
        }
        rest = &rest[consumed..];
        offset += consumed;
    }
    progress.add(pending);
    debug!(offset = base, lines = partial.lines, "chunk aggregated");
    Ok(partial)
}
