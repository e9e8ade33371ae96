//! Timed batch writes
//!
//! Writes generated batches to the test database and measures the
//! wall-clock time from the first write call to the end of the last.

use std::time::{Duration, Instant};

use log::debug;

use crate::bench::generator::Batch;
use crate::core::errors::{BenchError, BenchResult, StoreError};
use crate::core::store::TimeSeriesStore;

/// Timing of one write phase
#[derive(Debug, Clone, PartialEq)]
pub struct WriteTiming {
    /// Elapsed time of the whole phase
    pub elapsed: Duration,
    /// Number of store operations issued
    pub operations: usize,
    /// Number of points written
    pub points: usize,
    /// Individual write latencies (single-point path only)
    pub point_latencies: Vec<Duration>,
}

impl WriteTiming {
    /// Slowest individual write, when per-point timing was recorded
    pub fn slowest_write(&self) -> Option<Duration> {
        self.point_latencies.iter().max().copied()
    }
}

/// Write every batch to `database`, timing the whole phase
///
/// Points are moved into the store, so the batches are consumed.
///
/// Batch size 1 writes each point with its own `write_point` call and
/// times every call; larger sizes issue one `write_points` per batch.
/// The first failing call aborts the phase.
pub fn write_batches<S: TimeSeriesStore + ?Sized>(
    store: &mut S,
    database: &str,
    batches: Vec<Batch>,
    batch_size: usize,
) -> BenchResult<WriteTiming> {
    let total = batches.len();
    let progress_step = (total / 10).max(1);
    let mut operations = 0;
    let mut points = 0;
    // Single-point batches hold one point each
    let mut point_latencies = Vec::with_capacity(if batch_size == 1 { total } else { 0 });

    let start = Instant::now();
    let mut last_write = start;

    for (i, batch) in batches.into_iter().enumerate() {
        points += batch.len();

        if batch_size == 1 {
            for point in batch {
                store.write_point(database, point)
                    .map_err(|source| write_failure(batch_size, start, source))?;
                let now = Instant::now();
                point_latencies.push(now - last_write);
                last_write = now;
                operations += 1;
            }
        } else {
            store.write_points(database, batch)
                .map_err(|source| write_failure(batch_size, start, source))?;
            operations += 1;
        }

        if (i + 1) % progress_step == 0 {
            debug!("batch size {}: {}/{} batches written", batch_size, i + 1, total);
        }
    }

    let elapsed = start.elapsed();

    Ok(WriteTiming {
        elapsed,
        operations,
        points,
        point_latencies,
    })
}

fn write_failure(batch_size: usize, start: Instant, source: StoreError) -> BenchError {
    BenchError::WriteFailure {
        batch_size,
        elapsed: start.elapsed(),
        source,
    }
}
