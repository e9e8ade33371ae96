use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use tsbench::{CleanupMode, InfluxConfig};

use crate::commands;
use crate::commands::run::RunArgs;
use crate::context::{Context, StoreLocation};
use crate::formatters::OutputFormat;

#[derive(Parser)]
#[command(name = "tsbench")]
#[command(about = "Write-throughput benchmarks for time-series stores", long_about = None)]
struct Cli {
    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (text, json, table)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Directory of the persistent store
    #[arg(short, long, default_value = "tsbench_data")]
    data_dir: PathBuf,

    /// Use an in-memory store instead of the persistent one
    #[arg(long, conflicts_with = "influx_url")]
    in_memory: bool,

    /// Benchmark a running InfluxDB server instead of a local store
    #[arg(long)]
    influx_url: Option<String>,

    /// InfluxDB user
    #[arg(long, requires = "influx_url")]
    influx_user: Option<String>,

    /// InfluxDB password
    #[arg(long, requires = "influx_user")]
    influx_password: Option<String>,

    /// Benchmark configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark and print the report
    Run {
        /// Points written per batch size
        #[arg(short, long)]
        points: Option<usize>,

        /// Comma-separated batch sizes
        #[arg(short, long)]
        batch_sizes: Option<String>,

        /// Scratch database
        #[arg(long)]
        test_db: Option<String>,

        /// History database
        #[arg(long)]
        report_db: Option<String>,

        /// Cleanup strategy
        #[arg(long, value_enum)]
        cleanup: Option<CleanupMode>,
    },

    /// Print the averages of past runs
    History {
        /// History database
        #[arg(long)]
        report_db: Option<String>,
    },

    /// Run a query against the store
    Query {
        /// Query to run
        query: String,

        /// Database to query
        #[arg(long, default_value = "reports")]
        database: String,
    },

    /// Ask a running tsbench server for a report
    Remote {
        /// Server URL
        url: String,

        /// Points written per batch size
        #[arg(short, long)]
        points: Option<usize>,

        /// Comma-separated batch sizes
        #[arg(short, long)]
        batch_sizes: Option<String>,
    },
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    info!("tsbench CLI starting");

    let location = match cli.influx_url {
        Some(url) => StoreLocation::Influx(InfluxConfig {
            username: cli.influx_user,
            password: cli.influx_password,
            ..InfluxConfig::new(url)
        }),
        None if cli.in_memory => StoreLocation::Memory,
        None => StoreLocation::Disk(cli.data_dir),
    };

    let mut context = Context::new(cli.verbose, cli.format, location, cli.config.as_deref())?;

    match cli.command {
        Commands::Run { points, batch_sizes, test_db, report_db, cleanup } => {
            let args = RunArgs { points, batch_sizes, test_db, report_db, cleanup };
            commands::run::execute(&mut context, args)?;
        },
        Commands::History { report_db } => {
            commands::history::execute(&mut context, report_db.as_deref())?;
        },
        Commands::Query { query, database } => {
            commands::query::execute(&mut context, &database, &query)?;
        },
        Commands::Remote { url, points, batch_sizes } => {
            commands::remote::execute(&mut context, &url, points, batch_sizes.as_deref())?;
        },
    }

    Ok(())
}
