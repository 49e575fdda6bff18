//! Streaming min/mean/max aggregation over `<station>;<value>` files.

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod parallel;
pub mod parser;
pub mod progress;
pub mod reader;
pub mod report;
pub mod stats;
pub mod table;

pub use config::{EngineConfig, ProgressPolicy};
pub use engine::{CancelToken, Engine, EngineState, RunSummary};
pub use error::{Error, Result};
pub use parser::{parse_record, ParseError, Record};
pub use reader::StreamReader;
pub use report::{Report, ReportRow};
pub use stats::StationStats;
pub use table::AggregationTable;
