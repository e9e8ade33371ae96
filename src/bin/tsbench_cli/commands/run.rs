use anyhow::Result;
use log::info;
use tsbench::{BenchConfig, CleanupMode};
use tsbench::bench::config::parse_batch_sizes;

use crate::context::Context;
use crate::utils::error::CliError;

/// Overrides given on the command line
pub struct RunArgs {
    pub points: Option<usize>,
    pub batch_sizes: Option<String>,
    pub test_db: Option<String>,
    pub report_db: Option<String>,
    pub cleanup: Option<CleanupMode>,
}

/// Layer the command-line overrides on a base configuration
pub fn build_config(base: &BenchConfig, args: RunArgs) -> Result<BenchConfig> {
    let mut config = base.clone();

    if let Some(points) = args.points {
        config.points = points;
    }
    if let Some(sizes) = args.batch_sizes {
        config.batch_sizes = parse_batch_sizes(&sizes).map_err(CliError::from)?;
    }
    if let Some(db) = args.test_db {
        config.test_database = db;
    }
    if let Some(db) = args.report_db {
        config.report_database = db;
    }
    if let Some(cleanup) = args.cleanup {
        config.cleanup = cleanup;
    }

    Ok(config)
}

/// Run a benchmark and print its report
pub fn execute(context: &mut Context, args: RunArgs) -> Result<()> {
    let config = build_config(context.base_config(), args)?;
    info!("Running benchmark: {} points, batch sizes {:?}", config.points, config.batch_sizes);

    let report = context.bench()?.run(config).map_err(CliError::from)?;

    let formatted = context.formatter().format_report(&report)?;
    println!("{}", formatted);

    if context.verbosity() > 0 {
        println!("{}", context.formatter().format_success("Benchmark complete"));
    }

    Ok(())
}
