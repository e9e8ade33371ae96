use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tsbench::{BenchConfig, InfluxConfig, TsBench};
use tsbench::server::{BenchServer, ServerConfig};

#[derive(Parser)]
#[command(name = "tsbench-server")]
#[command(about = "HTTP server running tsbench write benchmarks", long_about = None)]
struct Cli {
    /// Path to the store (in-memory when omitted)
    #[arg(short, long, conflicts_with = "influx_url")]
    db_path: Option<PathBuf>,

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

    /// Listening port
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Listening address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Cli::parse();

    let base = match &args.config {
        Some(path) => BenchConfig::from_file(path)?,
        None => BenchConfig::default(),
    };
    base.validate()?;

    // The InfluxDB client is blocking and has to be built outside the runtime
    let tsbench = open_store(&args)?;

    let config = ServerConfig {
        port: args.port,
        host: args.host.clone(),
    };

    let server = BenchServer::new(tsbench, base, config);

    let rt = Runtime::new()?;
    rt.block_on(server.run())?;

    Ok(())
}

fn open_store(args: &Cli) -> Result<TsBench, Box<dyn std::error::Error>> {
    if let Some(url) = &args.influx_url {
        info!("Benchmarking InfluxDB at {}", url);
        let config = InfluxConfig {
            username: args.influx_user.clone(),
            password: args.influx_password.clone(),
            ..InfluxConfig::new(url.as_str())
        };
        return Ok(TsBench::new_influx(config)?);
    }

    match &args.db_path {
        Some(path) => {
            info!("Opening store at {:?}", path);
            Ok(TsBench::new_persistent(path)?)
        },
        None => {
            info!("Using an in-memory store");
            Ok(TsBench::new_in_memory())
        },
    }
}
