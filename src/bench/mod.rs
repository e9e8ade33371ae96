//! Write-throughput benchmark
//!
//! Generates synthetic sensor readings, writes them in batches of each
//! configured size while timing the writes, persists the results as a
//! history record and averages the history.

pub mod config;
pub mod generator;
pub mod writer;
pub mod format;
pub mod history;
pub mod runner;

pub use config::{BenchConfig, CleanupMode};
pub use format::BatchResult;
pub use history::{AggregatedHistory, Bucket, HistoricalRecord};
pub use runner::{Report, RunResult, Runner, TestDetails, run_benchmark};
