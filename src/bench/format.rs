//! Result formatting
//!
//! Every stored and serialized duration is in seconds (`f64`, unrounded).
//! Milliseconds and microseconds only appear at display time, rounded to
//! three decimals.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::bench::writer::WriteTiming;

/// Timing of one batch size within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Batch size tested
    pub batch_size: usize,
    /// Points written
    pub points: usize,
    /// Store operations issued
    pub write_operations: usize,
    /// Total write time
    pub total_time_s: f64,
    /// Write time per point; `None` when no point was written
    pub time_per_point_s: Option<f64>,
    /// Slowest single write (single-point path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowest_write_s: Option<f64>,
    /// Time spent dropping the measurement, when measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_time_s: Option<f64>,
    /// Drop time per point, when measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_time_per_point_s: Option<f64>,
}

/// Build the result of one batch size from its raw timings
pub fn format_result(
    batch_size: usize,
    num_points: usize,
    timing: &WriteTiming,
    drop_duration: Option<Duration>,
) -> BatchResult {
    let total_time_s = timing.elapsed.as_secs_f64();
    let drop_time_s = drop_duration.map(|d| d.as_secs_f64());

    BatchResult {
        batch_size,
        points: num_points,
        write_operations: timing.operations,
        total_time_s,
        time_per_point_s: per_point(total_time_s, num_points),
        slowest_write_s: timing.slowest_write().map(|d| d.as_secs_f64()),
        drop_time_s,
        drop_time_per_point_s: drop_time_s.and_then(|d| per_point(d, num_points)),
    }
}

fn per_point(seconds: f64, num_points: usize) -> Option<f64> {
    if num_points == 0 {
        None
    } else {
        Some(seconds / num_points as f64)
    }
}

/// Round to three decimal places
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Seconds to milliseconds, rounded for display
pub fn to_millis(seconds: f64) -> f64 {
    round3(seconds * 1_000.0)
}

/// Seconds to microseconds, rounded for display
pub fn to_micros(seconds: f64) -> f64 {
    round3(seconds * 1_000_000.0)
}

/// Display form of an optional duration in the given unit
pub fn display_opt(value: Option<f64>, convert: fn(f64) -> f64, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", convert(v), unit),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch size {}: {} points in {} ms ({} per point)",
            self.batch_size,
            self.points,
            to_millis(self.total_time_s),
            display_opt(self.time_per_point_s, to_micros, "µs"))?;

        if let Some(drop) = self.drop_time_s {
            write!(f, ", drop {} ms", to_millis(drop))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(millis: u64, operations: usize) -> WriteTiming {
        WriteTiming {
            elapsed: Duration::from_millis(millis),
            operations,
            points: 0,
            point_latencies: Vec::new(),
        }
    }

    #[test]
    fn test_per_point_consistency() {
        for &(millis, points) in &[(1234, 1000), (7, 3), (1, 1), (99_999, 17)] {
            let result = format_result(10, points, &timing(millis, 1), None);
            let per_point = result.time_per_point_s.unwrap();
            assert!((per_point * points as f64 - result.total_time_s).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_points_has_no_per_point_value() {
        let result = format_result(10, 0, &timing(5, 0), Some(Duration::from_millis(1)));
        assert_eq!(result.time_per_point_s, None);
        assert_eq!(result.drop_time_per_point_s, None);
        assert_eq!(result.drop_time_s, Some(0.001));
    }

    #[test]
    fn test_drop_timing() {
        let result = format_result(100, 1000, &timing(2000, 10), Some(Duration::from_millis(500)));
        assert_eq!(result.total_time_s, 2.0);
        assert_eq!(result.time_per_point_s, Some(0.002));
        assert_eq!(result.drop_time_s, Some(0.5));
        assert_eq!(result.drop_time_per_point_s, Some(0.0005));
        assert_eq!(result.write_operations, 10);
    }

    #[test]
    fn test_slowest_write_from_latencies() {
        let mut t = timing(10, 3);
        t.point_latencies = vec![
            Duration::from_millis(2),
            Duration::from_millis(5),
            Duration::from_millis(3),
        ];
        let result = format_result(1, 3, &t, None);
        assert_eq!(result.slowest_write_s, Some(0.005));
    }

    #[test]
    fn test_display_units() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(to_millis(1.5), 1500.0);
        assert_eq!(to_micros(0.0000123456), 12.346);

        let result = format_result(10, 1000, &timing(1500, 100), None);
        assert_eq!(result.to_string(), "batch size 10: 1000 points in 1500 ms (1500 µs per point)");
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let result = format_result(10, 10, &timing(10, 1), None);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("drop_time_s").is_none());
        assert!(json.get("slowest_write_s").is_none());
        assert!(json.get("total_time_s").is_some());
    }
}
