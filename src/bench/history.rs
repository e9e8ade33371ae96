//! Run history
//!
//! Each run is persisted as one record of the `reports` measurement whose
//! `json_results` field holds the serialized [`RunResult`]. Reading the
//! history back groups the total write times by canonical batch size and
//! averages them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use log::debug;
use serde::{Serialize, Deserialize};

use crate::bench::runner::RunResult;
use crate::core::errors::{BenchError, BenchResult, StoreError};
use crate::core::point::{Point, Record};
use crate::core::store::TimeSeriesStore;

/// Measurement holding the run history
pub const HISTORY_MEASUREMENT: &str = "reports";

/// Field holding the serialized run
pub const PAYLOAD_FIELD: &str = "json_results";

/// Minimum number of records before history is averaged
pub const MIN_RECORDS: usize = 2;

/// One persisted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Epoch seconds
    pub timestamp: i64,
    /// Serialized `RunResult`
    pub json_results: String,
}

impl HistoricalRecord {
    /// Decode the embedded run
    pub fn decode(&self) -> BenchResult<RunResult> {
        decode_payload(self.timestamp, &self.json_results)
    }

    fn from_record(record: Record) -> BenchResult<Self> {
        let json_results = record.get(PAYLOAD_FIELD)
            .and_then(|v| v.as_str())
            .ok_or_else(|| BenchError::MalformedHistory {
                timestamp: record.timestamp,
                reason: format!("missing string field {}", PAYLOAD_FIELD),
            })?
            .to_string();

        Ok(HistoricalRecord {
            timestamp: record.timestamp,
            json_results,
        })
    }
}

/// Canonical batch sizes history is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "100")]
    Hundred,
    #[serde(rename = "1000")]
    Thousand,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::One, Bucket::Ten, Bucket::Hundred, Bucket::Thousand];

    /// Batch size of the bucket
    pub fn batch_size(self) -> usize {
        match self {
            Bucket::One => 1,
            Bucket::Ten => 10,
            Bucket::Hundred => 100,
            Bucket::Thousand => 1000,
        }
    }

    /// Bucket of a batch size, if it is canonical
    pub fn from_batch_size(batch_size: usize) -> Option<Bucket> {
        Bucket::ALL.into_iter().find(|b| b.batch_size() == batch_size)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.batch_size())
    }
}

/// Average of one bucket across the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAverage {
    /// Mean total write time; `None` when no run tested this batch size
    pub average_s: Option<f64>,
    /// Number of runs contributing
    pub samples: usize,
}

/// Averages over all persisted runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedHistory {
    /// Number of runs read
    pub record_count: usize,
    /// Per-bucket averages, always holding the four canonical buckets
    pub buckets: BTreeMap<Bucket, BucketAverage>,
    /// Sum of the bucket averages that exist
    pub grand_total_s: f64,
}

impl AggregatedHistory {
    /// Average of one bucket
    pub fn average(&self, bucket: Bucket) -> Option<f64> {
        self.buckets.get(&bucket).and_then(|b| b.average_s)
    }
}

/// Persist a run as a new history record
pub fn persist<S: TimeSeriesStore + ?Sized>(
    store: &mut S,
    database: &str,
    run: &RunResult,
) -> BenchResult<HistoricalRecord> {
    let json_results = serde_json::to_string(run)
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;

    let record = HistoricalRecord {
        timestamp: Utc::now().timestamp(),
        json_results,
    };

    let point = Point::new(HISTORY_MEASUREMENT)
        .field(PAYLOAD_FIELD, record.json_results.as_str())
        .timestamp(record.timestamp);

    store.write_point(database, point)?;
    store.flush()?;

    debug!("persisted run {} to {}", run.run_id, database);
    Ok(record)
}

/// Read every history record in insertion order
pub fn load_records<S: TimeSeriesStore + ?Sized>(
    store: &S,
    database: &str,
) -> BenchResult<Vec<HistoricalRecord>> {
    let query = format!("SELECT * FROM \"{}\"", HISTORY_MEASUREMENT);

    store.query(database, &query)?
        .into_iter()
        .map(HistoricalRecord::from_record)
        .collect()
}

/// Decode a stored payload into a run
///
/// Payloads written by older tools may be a JSON string wrapping the
/// actual document; such payloads are decoded twice.
pub fn decode_payload(timestamp: i64, payload: &str) -> BenchResult<RunResult> {
    let malformed = |reason: String| BenchError::MalformedHistory { timestamp, reason };

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| malformed(e.to_string()))?;

    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| malformed(format!("double-encoded payload: {}", e)))?,
        other => other,
    };

    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// Average the history; `None` with fewer than two records
///
/// Any record that fails to decode fails the whole aggregation.
pub fn aggregate(records: &[HistoricalRecord]) -> BenchResult<Option<AggregatedHistory>> {
    if records.len() < MIN_RECORDS {
        return Ok(None);
    }

    let runs = records.iter()
        .map(HistoricalRecord::decode)
        .collect::<BenchResult<Vec<RunResult>>>()?;

    Ok(aggregate_runs(&runs))
}

/// Average already decoded runs; `None` with fewer than two runs
pub fn aggregate_runs(runs: &[RunResult]) -> Option<AggregatedHistory> {
    if runs.len() < MIN_RECORDS {
        return None;
    }

    let mut sorted: BTreeMap<Bucket, Vec<f64>> = Bucket::ALL.iter()
        .map(|b| (*b, Vec::new()))
        .collect();

    for run in runs {
        for result in &run.results {
            // Non-canonical batch sizes are not tracked in history
            if let Some(bucket) = Bucket::from_batch_size(result.batch_size) {
                sorted.entry(bucket).or_default().push(result.total_time_s);
            }
        }
    }

    let buckets: BTreeMap<Bucket, BucketAverage> = sorted.into_iter()
        .map(|(bucket, times)| (bucket, average(times)))
        .collect();

    let grand_total_s = buckets.values()
        .filter_map(|b| b.average_s)
        .sum();

    Some(AggregatedHistory {
        record_count: runs.len(),
        buckets,
        grand_total_s,
    })
}

fn average(mut times: Vec<f64>) -> BucketAverage {
    if times.is_empty() {
        return BucketAverage { average_s: None, samples: 0 };
    }

    // Summing in sorted order makes the result independent of record order
    times.sort_by(|a, b| a.total_cmp(b));
    let sum: f64 = times.iter().sum();

    BucketAverage {
        average_s: Some(sum / times.len() as f64),
        samples: times.len(),
    }
}

/// Read the whole history and average it
pub fn load_and_average<S: TimeSeriesStore + ?Sized>(
    store: &S,
    database: &str,
) -> BenchResult<Option<AggregatedHistory>> {
    let records = load_records(store, database)?;
    debug!("loaded {} history records from {}", records.len(), database);

    aggregate(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::format::BatchResult;
    use crate::bench::runner::{RunResult, TestDetails};
    use crate::storage::MemoryStore;
    use uuid::Uuid;

    fn batch(batch_size: usize, total_time_s: f64) -> BatchResult {
        BatchResult {
            batch_size,
            points: 1000,
            write_operations: 1000 / batch_size,
            total_time_s,
            time_per_point_s: Some(total_time_s / 1000.0),
            slowest_write_s: None,
            drop_time_s: None,
            drop_time_per_point_s: None,
        }
    }

    fn run(results: Vec<BatchResult>) -> RunResult {
        RunResult {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            details: TestDetails {
                num_test_points: 1000,
                batch_sizes: results.iter().map(|r| r.batch_size).collect(),
                test_database_name: "benchmark".to_string(),
                report_database_name: "reports".to_string(),
            },
            results,
        }
    }

    fn record(run: &RunResult) -> HistoricalRecord {
        HistoricalRecord {
            timestamp: 0,
            json_results: serde_json::to_string(run).unwrap(),
        }
    }

    #[test]
    fn test_bucket_ten_average() {
        let records = vec![
            record(&run(vec![batch(10, 2.0)])),
            record(&run(vec![batch(10, 3.0)])),
        ];

        let history = aggregate(&records).unwrap().unwrap();
        assert_eq!(history.average(Bucket::Ten), Some(2.5));
        assert_eq!(history.buckets[&Bucket::Ten].samples, 2);
        assert_eq!(history.grand_total_s, 2.5);
        assert_eq!(history.record_count, 2);
    }

    #[test]
    fn test_empty_bucket_reports_no_data() {
        let records = vec![
            record(&run(vec![batch(1, 4.0), batch(10, 1.0)])),
            record(&run(vec![batch(1, 2.0), batch(10, 1.0)])),
        ];

        let history = aggregate(&records).unwrap().unwrap();
        assert_eq!(history.buckets.len(), 4);
        assert_eq!(history.average(Bucket::Hundred), None);
        assert_eq!(history.buckets[&Bucket::Thousand].samples, 0);
        assert_eq!(history.average(Bucket::One), Some(3.0));
        assert_eq!(history.grand_total_s, 4.0);
    }

    #[test]
    fn test_fewer_than_two_records() {
        assert_eq!(aggregate(&[]).unwrap(), None);
        assert_eq!(aggregate(&[record(&run(vec![batch(10, 1.0)]))]).unwrap(), None);
    }

    #[test]
    fn test_order_independent() {
        let runs = vec![
            run(vec![batch(1, 0.1), batch(10, 0.7), batch(1000, 0.01)]),
            run(vec![batch(1, 0.2), batch(100, 0.3)]),
            run(vec![batch(1, 0.3), batch(10, 0.11), batch(100, 0.013)]),
            run(vec![batch(10, 1e-9), batch(1000, 12.5)]),
        ];

        let forward = aggregate_runs(&runs).unwrap();
        let mut reversed_runs = runs.clone();
        reversed_runs.reverse();
        let reversed = aggregate_runs(&reversed_runs).unwrap();
        let rotated: Vec<RunResult> = runs[2..].iter().chain(runs[..2].iter()).cloned().collect();

        assert_eq!(forward, reversed);
        assert_eq!(forward, aggregate_runs(&rotated).unwrap());
    }

    #[test]
    fn test_non_canonical_batch_sizes_ignored() {
        let runs = vec![run(vec![batch(2, 9.0)]), run(vec![batch(4, 9.0)])];
        let history = aggregate_runs(&runs).unwrap();
        assert!(Bucket::ALL.iter().all(|b| history.average(*b).is_none()));
        assert_eq!(history.grand_total_s, 0.0);
    }

    #[test]
    fn test_malformed_record_fails() {
        let records = vec![
            record(&run(vec![batch(10, 2.0)])),
            HistoricalRecord { timestamp: 42, json_results: "{not json".to_string() },
        ];

        match aggregate(&records) {
            Err(BenchError::MalformedHistory { timestamp, .. }) => assert_eq!(timestamp, 42),
            other => panic!("expected malformed history, got {:?}", other),
        }
    }

    #[test]
    fn test_double_encoded_payload() {
        let original = run(vec![batch(100, 0.25)]);
        let inner = serde_json::to_string(&original).unwrap();
        let wrapped = serde_json::to_string(&inner).unwrap();

        assert_eq!(decode_payload(0, &wrapped).unwrap(), original);
        assert_eq!(decode_payload(0, &inner).unwrap(), original);
    }

    #[test]
    fn test_persist_round_trip() {
        let mut store = MemoryStore::new();
        store.create_database("reports").unwrap();

        let original = run(vec![batch(1, 1.5), batch(1000, 0.02)]);
        let persisted = persist(&mut store, "reports", &original).unwrap();

        let records = load_records(&store, "reports").unwrap();
        assert_eq!(records, vec![persisted]);
        assert_eq!(records[0].decode().unwrap(), original);
    }

    #[test]
    fn test_persist_round_trip_unrounded_times() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut store = MemoryStore::new();
        store.create_database("reports").unwrap();

        let mut runs = vec![run(vec![batch(1, 1.9274978807147658), batch(10, 0.1 + 0.2)])];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            runs.push(run(vec![batch(100, rng.gen_range(0.0..5.0)), batch(1000, rng.gen_range(0.0..1e-3))]));
        }

        for r in &runs {
            persist(&mut store, "reports", r).unwrap();
        }

        let decoded: Vec<RunResult> = load_records(&store, "reports").unwrap()
            .iter()
            .map(|r| r.decode().unwrap())
            .collect();
        assert_eq!(decoded, runs);
        assert_eq!(decoded[0].results[0].total_time_s, 1.9274978807147658);
    }

    #[test]
    fn test_load_and_average_from_store() {
        let mut store = MemoryStore::new();
        store.create_database("reports").unwrap();
        assert_eq!(load_and_average(&store, "reports").unwrap(), None);

        persist(&mut store, "reports", &run(vec![batch(10, 2.0)])).unwrap();
        assert_eq!(load_and_average(&store, "reports").unwrap(), None);

        persist(&mut store, "reports", &run(vec![batch(10, 3.0)])).unwrap();
        let history = load_and_average(&store, "reports").unwrap().unwrap();
        assert_eq!(history.average(Bucket::Ten), Some(2.5));
    }

    #[test]
    fn test_record_without_payload_is_malformed() {
        let mut store = MemoryStore::new();
        store.create_database("reports").unwrap();
        store.write_point("reports", Point::new(HISTORY_MEASUREMENT).field("other", 1i64)).unwrap();

        assert!(matches!(
            load_records(&store, "reports"),
            Err(BenchError::MalformedHistory { .. })
        ));
    }

    #[test]
    fn test_bucket_keys_serialize_as_batch_sizes() {
        let runs = vec![run(vec![batch(10, 2.0)]), run(vec![batch(10, 4.0)])];
        let json = serde_json::to_value(aggregate_runs(&runs).unwrap()).unwrap();
        assert_eq!(json["buckets"]["10"]["average_s"], serde_json::json!(3.0));
        assert!(json["buckets"]["1"]["average_s"].is_null());
    }
}
