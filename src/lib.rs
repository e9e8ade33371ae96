//! tsbench: write-throughput benchmarks for time-series stores
//!
//! This crate generates synthetic sensor readings, writes them to a store
//! in configurable batch sizes, times the writes, keeps every run as a
//! history record and reports averages over the history.

pub mod core;
pub mod storage;
pub mod ql;
pub mod bench;
pub mod server;

use std::path::{Path as StdPath, PathBuf};
use crate::core::store::TimeSeriesStore;
use storage::{InfluxStore, MemoryStore, PersistentStore};

/// Main API: a store plus the benchmark operations run against it
pub struct TsBench {
    store: Box<dyn TimeSeriesStore>,
}

impl TsBench {
    /// Benchmark an in-memory store
    pub fn new_in_memory() -> Self {
        TsBench {
            store: Box::new(MemoryStore::new()),
        }
    }

    /// Benchmark a persistent store at the given path
    pub fn new_persistent<P: AsRef<StdPath>>(path: P) -> Result<Self> {
        let persistent_store = PersistentStore::open(PathBuf::from(path.as_ref()))?;
        Ok(TsBench {
            store: Box::new(persistent_store),
        })
    }

    /// Benchmark a running InfluxDB server
    pub fn new_influx(config: InfluxConfig) -> Result<Self> {
        Ok(TsBench {
            store: Box::new(InfluxStore::connect(config)?),
        })
    }

    /// Benchmark any store
    pub fn with_store(store: Box<dyn TimeSeriesStore>) -> Self {
        TsBench { store }
    }

    /// Run one benchmark
    pub fn run(&mut self, config: BenchConfig) -> BenchResult<Report> {
        bench::run_benchmark(self.store.as_mut(), config)
    }

    /// Averages over the history kept in `database`
    pub fn past_averages(&self, database: &str) -> BenchResult<Option<AggregatedHistory>> {
        if !self.store.database_exists(database)? {
            return Ok(None);
        }

        bench::history::load_and_average(self.store.as_ref(), database)
    }

    /// Run a query against a database
    pub fn query(&self, database: &str, query: &str) -> Result<Vec<Record>> {
        self.store.query(database, query)
    }

    /// List the store's databases
    pub fn databases(&self) -> Result<Vec<String>> {
        self.store.list_databases()
    }

    /// Flush the store
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}

pub use crate::core::errors::{Result, StoreError, BenchError, BenchResult};
pub use crate::core::point::{FieldValue, Point, Record};
pub use storage::InfluxConfig;
pub use bench::{AggregatedHistory, BatchResult, BenchConfig, Bucket, CleanupMode, Report, RunResult};
