use std::time::Duration;

use crate::error::{Error, Result};
use crate::reader::DEFAULT_BUFFER_SIZE;
use crate::table::DEFAULT_CAPACITY;

pub const DEFAULT_PROGRESS_LINES: u64 = 10_000_000;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);
/// Upper bound on parallel workers.
pub const MAX_THREADS: usize = 1024;

/// When the engine logs a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPolicy {
    /// Every `n` successfully parsed lines.
    EveryLines(u64),
    /// At most once per interval of wall-clock time.
    EveryInterval(Duration),
    Disabled,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        ProgressPolicy::EveryLines(DEFAULT_PROGRESS_LINES)
    }
}

/// Tunables for a single aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Size of the stream reader's buffer in bytes.
    pub buffer_size: usize,
    /// Number of distinct keys the table is pre-sized for.
    pub capacity_hint: usize,
    pub progress: ProgressPolicy,
    /// Worker count for the memory-mapped engine; 0 selects the sequential engine.
    pub threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            capacity_hint: DEFAULT_CAPACITY,
            progress: ProgressPolicy::default(),
            threads: 0,
        }
    }
}

impl EngineConfig {
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }

    pub fn with_progress(mut self, progress: ProgressPolicy) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("buffer size must be greater than 0".to_string()));
        }
        if self.threads > MAX_THREADS {
            return Err(Error::InvalidConfig(format!(
                "thread count {} exceeds the maximum of {}",
                self.threads, MAX_THREADS
            )));
        }
        match self.progress {
            ProgressPolicy::EveryLines(0) => Err(Error::InvalidConfig(
                "progress line interval must be greater than 0".to_string(),
            )),
            ProgressPolicy::EveryInterval(d) if d.is_zero() => Err(Error::InvalidConfig(
                "progress time interval must be greater than 0".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
