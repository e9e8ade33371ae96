//! Benchmark runner
//!
//! A `Runner` owns one benchmark run: it prepares the databases, writes
//! and times every configured batch size in order, cleans up the scratch
//! data, persists the run and folds in the averaged history.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::bench::config::{BenchConfig, CleanupMode};
use crate::bench::format::{self, BatchResult};
use crate::bench::generator;
use crate::bench::history::{self, AggregatedHistory};
use crate::bench::writer;
use crate::core::errors::{BenchError, BenchResult};
use crate::core::store::TimeSeriesStore;

/// Parameters of a run, stored alongside its results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDetails {
    pub num_test_points: usize,
    pub batch_sizes: Vec<usize>,
    pub test_database_name: String,
    pub report_database_name: String,
}

/// Results of one run, as persisted in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// One result per batch size, in the configured order
    pub results: Vec<BatchResult>,
    pub details: TestDetails,
}

impl RunResult {
    /// Result of a batch size, if it was tested
    pub fn get(&self, batch_size: usize) -> Option<&BatchResult> {
        self.results.iter().find(|r| r.batch_size == batch_size)
    }
}

/// Final output of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// This run's results
    pub run: RunResult,
    /// Averages over the history, `None` until at least two runs exist
    pub past_averages: Option<AggregatedHistory>,
    /// Why the history could not be averaged, if it could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_error: Option<String>,
    /// Wall-clock time of the whole run
    pub elapsed_s: f64,
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    DatabasesPrepared,
    Generating(usize),
    Writing(usize),
    Formatting(usize),
    Persisted,
    Aggregated,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Initialized => write!(f, "initialized"),
            RunState::DatabasesPrepared => write!(f, "databases prepared"),
            RunState::Generating(size) => write!(f, "generating (batch size {})", size),
            RunState::Writing(size) => write!(f, "writing (batch size {})", size),
            RunState::Formatting(size) => write!(f, "formatting (batch size {})", size),
            RunState::Persisted => write!(f, "persisted"),
            RunState::Aggregated => write!(f, "aggregated"),
            RunState::Done => write!(f, "done"),
        }
    }
}

/// Runs one benchmark against a store
pub struct Runner<'a, S: TimeSeriesStore + ?Sized> {
    /// The store under test
    store: &'a mut S,
    /// Run configuration
    config: BenchConfig,
    /// Current lifecycle state
    state: RunState,
}

impl<'a, S: TimeSeriesStore + ?Sized> Runner<'a, S> {
    /// Create a runner for the given store
    pub fn new(store: &'a mut S, config: BenchConfig) -> Self {
        Runner {
            store,
            config,
            state: RunState::Initialized,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Configuration of the run
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    fn transition(&mut self, next: RunState) {
        debug!("runner: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Execute the whole run
    pub fn run(&mut self) -> BenchResult<Report> {
        self.config.validate()?;

        let run_start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        info!("run {}: {} points, batch sizes {:?}",
            run_id, self.config.points, self.config.batch_sizes);

        self.prepare_databases()?;

        let mut results = Vec::with_capacity(self.config.batch_sizes.len());
        for batch_size in self.config.batch_sizes.clone() {
            let result = self.run_batch_size(batch_size)?;
            info!("{}", result);
            results.push(result);
        }

        self.store.delete_database(&self.config.test_database)?;

        let run = RunResult {
            run_id,
            started_at,
            results,
            details: TestDetails {
                num_test_points: self.config.points,
                batch_sizes: self.config.batch_sizes.clone(),
                test_database_name: self.config.test_database.clone(),
                report_database_name: self.config.report_database.clone(),
            },
        };

        history::persist(&mut *self.store, &self.config.report_database, &run)?;
        self.transition(RunState::Persisted);

        // The run is durable at this point; bad history only loses the averages
        let (past_averages, history_error) =
            match history::load_and_average(&*self.store, &self.config.report_database) {
                Ok(averages) => (averages, None),
                Err(e @ BenchError::MalformedHistory { .. }) => {
                    warn!("history not averaged: {}", e);
                    (None, Some(e.to_string()))
                },
                Err(e) => return Err(e),
            };
        self.transition(RunState::Aggregated);

        let elapsed_s = run_start.elapsed().as_secs_f64();
        info!("run {} finished in {:.3} s", run_id, elapsed_s);
        self.transition(RunState::Done);

        Ok(Report {
            run,
            past_averages,
            history_error,
            elapsed_s,
        })
    }

    /// Make sure both databases exist, creating whichever is missing
    fn prepare_databases(&mut self) -> BenchResult<()> {
        let existing = self.store.list_databases()
            .map_err(BenchError::StoreUnavailable)?;

        for name in [&self.config.test_database, &self.config.report_database] {
            if !existing.iter().any(|db| db == name) {
                debug!("creating database {}", name);
                self.store.create_database(name)
                    .map_err(BenchError::StoreUnavailable)?;
            }
        }

        self.transition(RunState::DatabasesPrepared);
        Ok(())
    }

    /// Generate, write and format one batch size
    fn run_batch_size(&mut self, batch_size: usize) -> BenchResult<BatchResult> {
        let points = self.config.points;

        self.transition(RunState::Generating(batch_size));
        let batches = generator::generate(batch_size, points);

        self.transition(RunState::Writing(batch_size));
        let timing = writer::write_batches(
            &mut *self.store,
            &self.config.test_database,
            batches,
            batch_size,
        )?;

        let drop_duration = match self.config.cleanup {
            CleanupMode::DropMeasurement => Some(self.drop_series(batch_size)?),
            CleanupMode::DropDatabase => None,
        };

        self.transition(RunState::Formatting(batch_size));
        Ok(format::format_result(batch_size, points, &timing, drop_duration))
    }

    fn drop_series(&mut self, batch_size: usize) -> BenchResult<Duration> {
        let start = Instant::now();
        self.store.drop_measurement(&self.config.test_database, &batch_size.to_string())?;
        Ok(start.elapsed())
    }
}

/// Run a benchmark with the given configuration
pub fn run_benchmark<S: TimeSeriesStore + ?Sized>(store: &mut S, config: BenchConfig) -> BenchResult<Report> {
    Runner::new(store, config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::history::{Bucket, HISTORY_MEASUREMENT};
    use crate::bench::writer::tests::CountingStore;
    use crate::core::errors::{Result, StoreError};
    use crate::core::point::{Point, Record};
    use crate::storage::MemoryStore;

    fn config(points: usize, batch_sizes: Vec<usize>) -> BenchConfig {
        BenchConfig {
            points,
            batch_sizes,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn test_scenario_four_points() {
        let mut store = CountingStore::default();
        let mut runner = Runner::new(&mut store, config(4, vec![1, 2, 4]));
        let report = runner.run().unwrap();
        assert_eq!(runner.state(), RunState::Done);

        // Four single-point writes plus the history record
        assert_eq!(store.single_writes, 5);
        assert_eq!(store.bulk_writes, vec![2, 2, 4]);

        let sizes: Vec<usize> = report.run.results.iter().map(|r| r.batch_size).collect();
        assert_eq!(sizes, vec![1, 2, 4]);
        assert_eq!(report.run.get(1).unwrap().write_operations, 4);
        assert_eq!(report.run.get(2).unwrap().write_operations, 2);
        assert_eq!(report.run.get(4).unwrap().write_operations, 1);
        assert!(report.run.get(1).unwrap().slowest_write_s.is_some());
    }

    #[test]
    fn test_fresh_store_has_no_past_averages() {
        let mut store = MemoryStore::new();
        let report = run_benchmark(&mut store, config(10, vec![1, 10])).unwrap();

        assert_eq!(report.past_averages, None);
        assert_eq!(report.history_error, None);
        assert_eq!(report.run.details.test_database_name, "benchmark");
        assert!(report.elapsed_s >= report.run.results.iter().map(|r| r.total_time_s).sum::<f64>());

        // Scratch database is gone, history remains
        assert_eq!(store.list_databases().unwrap(), vec!["reports".to_string()]);
        assert_eq!(store.len("reports").unwrap(), 1);
    }

    #[test]
    fn test_second_run_averages_history() {
        let mut store = MemoryStore::new();
        let first = run_benchmark(&mut store, config(10, vec![1, 10])).unwrap();
        let second = run_benchmark(&mut store, config(10, vec![1, 10])).unwrap();

        let history = second.past_averages.unwrap();
        assert_eq!(history.record_count, 2);

        let expected = (first.run.get(10).unwrap().total_time_s
            + second.run.get(10).unwrap().total_time_s) / 2.0;
        let average = history.average(Bucket::Ten).unwrap();
        assert!((average - expected).abs() < 1e-12);
        assert_eq!(history.average(Bucket::Hundred), None);
    }

    #[test]
    fn test_existing_databases_are_kept() {
        let mut store = MemoryStore::new();
        store.create_database("reports").unwrap();
        store.create_database("benchmark").unwrap();

        run_benchmark(&mut store, config(5, vec![5])).unwrap();
        run_benchmark(&mut store, config(5, vec![5])).unwrap();
        assert_eq!(store.len("reports").unwrap(), 2);
    }

    #[test]
    fn test_drop_measurement_cleanup() {
        let mut store = CountingStore::default();
        let cfg = BenchConfig {
            cleanup: CleanupMode::DropMeasurement,
            ..config(20, vec![10, 100])
        };

        let report = run_benchmark(&mut store, cfg).unwrap();

        assert_eq!(store.dropped, vec!["10".to_string(), "100".to_string()]);
        assert!(report.run.results.iter().all(|r| r.drop_time_s.is_some()));
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let mut store = MemoryStore::new();
        let result = run_benchmark(&mut store, config(0, vec![1]));

        assert!(matches!(result, Err(BenchError::InvalidConfig(_))));
        assert!(store.list_databases().unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_aborts_run() {
        let mut store = CountingStore::default();
        // One bulk write per batch size; the second one fails
        store.fail_on_write = Some(2);

        let result = run_benchmark(&mut store, config(4, vec![10, 100]));

        assert!(matches!(result, Err(BenchError::WriteFailure { batch_size: 100, .. })));
        assert_eq!(store.inner.len("reports").unwrap(), 0);
    }

    #[test]
    fn test_malformed_history_keeps_fresh_results() {
        let mut store = MemoryStore::new();
        store.create_database("reports").unwrap();
        store.write_point("reports", Point::new(HISTORY_MEASUREMENT)
            .field("json_results", "{broken")
            .timestamp(1)).unwrap();

        let report = run_benchmark(&mut store, config(3, vec![1])).unwrap();

        assert_eq!(report.past_averages, None);
        assert!(report.history_error.unwrap().contains("Malformed history"));
        assert_eq!(report.run.results.len(), 1);
        assert_eq!(store.len("reports").unwrap(), 2);
    }

    /// Store whose catalog cannot be read
    struct UnreachableStore;

    impl TimeSeriesStore for UnreachableStore {
        fn list_databases(&self) -> Result<Vec<String>> {
            Err(StoreError::Internal("connection refused".to_string()))
        }
        fn create_database(&mut self, _: &str) -> Result<()> {
            unreachable!()
        }
        fn delete_database(&mut self, _: &str) -> Result<()> {
            unreachable!()
        }
        fn write_point(&mut self, _: &str, _: Point) -> Result<()> {
            unreachable!()
        }
        fn write_points(&mut self, _: &str, _: Vec<Point>) -> Result<()> {
            unreachable!()
        }
        fn query(&self, _: &str, _: &str) -> Result<Vec<Record>> {
            unreachable!()
        }
        fn drop_measurement(&mut self, _: &str, _: &str) -> Result<()> {
            unreachable!()
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unreachable_store() {
        let mut store = UnreachableStore;
        let result = run_benchmark(&mut store, BenchConfig::default());
        assert!(matches!(result, Err(BenchError::StoreUnavailable(_))));
    }

    #[test]
    fn test_report_json_round_trip() {
        let mut store = MemoryStore::new();
        let report = run_benchmark(&mut store, config(4, vec![1, 2])).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let decoded: Report = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, report);
    }
}
