//! Benchmark configuration

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Serialize, Deserialize};

use crate::core::errors::{BenchError, BenchResult};

/// How the scratch data of a batch size is cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupMode {
    /// Leave the data in place until the test database is deleted
    #[default]
    DropDatabase,
    /// Drop each batch size's measurement right after writing it, timing the drop
    DropMeasurement,
}

impl fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupMode::DropDatabase => write!(f, "drop-database"),
            CleanupMode::DropMeasurement => write!(f, "drop-measurement"),
        }
    }
}

impl FromStr for CleanupMode {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        match s {
            "drop-database" => Ok(CleanupMode::DropDatabase),
            "drop-measurement" => Ok(CleanupMode::DropMeasurement),
            other => Err(BenchError::InvalidConfig(format!("Unknown cleanup mode: {}", other))),
        }
    }
}

/// Configuration of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Number of points written per batch size
    pub points: usize,
    /// Batch sizes to test, in order
    pub batch_sizes: Vec<usize>,
    /// Scratch database, deleted after every run
    pub test_database: String,
    /// Database accumulating the run history
    pub report_database: String,
    /// Cleanup strategy for scratch data
    pub cleanup: CleanupMode,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            points: 1000,
            batch_sizes: vec![1, 10, 100, 1000],
            test_database: "benchmark".to_string(),
            report_database: "reports".to_string(),
            cleanup: CleanupMode::DropDatabase,
        }
    }
}

impl BenchConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| BenchError::InvalidConfig(format!(
                "Failed to parse {}: {}", path.as_ref().display(), e
            )))
    }

    /// Check the configuration before anything touches the store
    pub fn validate(&self) -> BenchResult<()> {
        if self.points == 0 {
            return Err(BenchError::InvalidConfig("points must be greater than 0".to_string()));
        }

        if self.batch_sizes.is_empty() {
            return Err(BenchError::InvalidConfig("at least one batch size is required".to_string()));
        }

        if self.batch_sizes.contains(&0) {
            return Err(BenchError::InvalidConfig("batch sizes must be greater than 0".to_string()));
        }

        let mut seen = HashSet::new();
        for size in &self.batch_sizes {
            if !seen.insert(size) {
                return Err(BenchError::InvalidConfig(format!("duplicate batch size: {}", size)));
            }
        }

        if self.test_database.is_empty() || self.report_database.is_empty() {
            return Err(BenchError::InvalidConfig("database names cannot be empty".to_string()));
        }

        if self.test_database == self.report_database {
            return Err(BenchError::InvalidConfig(
                "test and report databases must differ".to_string()
            ));
        }

        Ok(())
    }
}

/// Parse a comma-separated list of batch sizes ("1,10,100")
pub fn parse_batch_sizes(input: &str) -> BenchResult<Vec<usize>> {
    input.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>()
            .map_err(|_| BenchError::InvalidConfig(format!("Invalid batch size: {}", s))))
        .collect()
}
