//! Synthetic sensor data
//!
//! Builds `num_points` readings labelled with the batch size and cuts
//! them into contiguous batches.

use rand::Rng;

use crate::core::point::Point;

/// Lower bound (inclusive) of generated temperatures
pub const TEMPERATURE_MIN: i64 = 37;
/// Upper bound (exclusive) of generated temperatures
pub const TEMPERATURE_MAX: i64 = 82;
/// Upper bound (exclusive) of generated wind speeds
pub const WIND_SPEED_MAX: i64 = 31;
/// Status carried by every reading
pub const STATUS: &str = "working";

/// A contiguous slice of generated points, written as one unit
pub type Batch = Vec<Point>;

/// Generate `num_points` readings split into batches of `batch_size`
pub fn generate(batch_size: usize, num_points: usize) -> Vec<Batch> {
    generate_with_rng(batch_size, num_points, &mut rand::thread_rng())
}

/// Same as [`generate`] with a caller-supplied random source
pub fn generate_with_rng<R: Rng>(batch_size: usize, num_points: usize, rng: &mut R) -> Vec<Batch> {
    if batch_size == 0 || num_points == 0 {
        return Vec::new();
    }

    let series = batch_size.to_string();

    let points: Vec<Point> = (1..=num_points)
        .map(|n| {
            Point::new(series.as_str())
                .field("temperature", rng.gen_range(TEMPERATURE_MIN..TEMPERATURE_MAX))
                .field("wind_speed", rng.gen_range(0..WIND_SPEED_MAX) as f64)
                .field("status", STATUS)
                .tag("sensor_id", format!("sensor_{}", n))
        })
        .collect();

    // chunks() never yields an empty trailing slice
    points.chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}
