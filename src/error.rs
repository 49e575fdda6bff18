//! Error types for the aggregation engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a run.
///
/// Malformed records are not represented here: they are skipped by the
/// engine and reported through [`crate::parser::ParseError`].
#[derive(Error, Debug)]
pub enum Error {
    /// The input file could not be opened or mapped
    #[error("cannot open input {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Reading from the input failed mid-stream
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// An output file could not be created
    #[error("cannot create output {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    /// Writing output failed
    #[error("write error: {0}")]
    Write(#[source] io::Error),

    /// Configuration rejected before any processing started
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was aborted through a [`crate::engine::CancelToken`]
    #[error("run cancelled after {lines} lines")]
    Cancelled { lines: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
