//! Benchmark runner for tsbench
//!
//! Runs the write benchmark three times against a fresh persistent store,
//! so the last run reports averages over the history.

use std::fs;
use tsbench::{BenchConfig, Bucket, CleanupMode, TsBench};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("tsbench write benchmark");
    println!("=======================");

    let bench_dir = "tsbench_demo";
    let _ = fs::remove_dir_all(bench_dir);

    let mut bench = TsBench::new_persistent(bench_dir)?;

    let config = BenchConfig {
        points: 2_000,
        cleanup: CleanupMode::DropMeasurement,
        ..BenchConfig::default()
    };

    for round in 1..=3 {
        let report = bench.run(config.clone())?;
        println!("\nRound {} ({})", round, report.run.run_id);
        for result in &report.run.results {
            println!("  {}", result);
        }

        if let Some(history) = &report.past_averages {
            println!("  averages over {} runs:", history.record_count);
            for bucket in Bucket::ALL {
                match history.average(bucket) {
                    Some(avg) => println!("    batch size {}: {:.3} ms", bucket, avg * 1000.0),
                    None => println!("    batch size {}: n/a", bucket),
                }
            }
        }
    }

    bench.flush()?;
    let _ = fs::remove_dir_all(bench_dir);

    Ok(())
}
