use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::info;
use tokio::runtime::Runtime;
use tsbench::{BenchConfig, InfluxConfig, TsBench};

use crate::formatters::{OutputFormat, Formatter};
use crate::formatters::text::TextFormatter;
use crate::formatters::json::JsonFormatter;
use crate::formatters::table::TableFormatter;

/// Where the benchmarked store lives
pub enum StoreLocation {
    Memory,
    Disk(PathBuf),
    Influx(InfluxConfig),
}

/// Execution context of the CLI
pub struct Context {
    /// Store location, opened on first use
    location: StoreLocation,

    /// Opened store
    bench: Option<TsBench>,

    /// Configuration from the config file, or the defaults
    base: BenchConfig,

    /// Verbosity level
    verbosity: u8,

    /// Current formatter
    formatter: Box<dyn Formatter>,

    /// Tokio runtime for remote calls
    runtime: Runtime,
}

impl Context {
    /// Create a new context
    pub fn new(
        verbosity: u8,
        format: OutputFormat,
        location: StoreLocation,
        config: Option<&Path>,
    ) -> Result<Self> {
        let formatter: Box<dyn Formatter> = match format {
            OutputFormat::Text => Box::new(TextFormatter::new()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Table => Box::new(TableFormatter::new()),
        };

        let base = match config {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                BenchConfig::from_file(path)?
            },
            None => BenchConfig::default(),
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow!("Failed to create Tokio runtime: {}", e))?;

        Ok(Context {
            location,
            bench: None,
            base,
            verbosity,
            formatter,
            runtime,
        })
    }

    /// The store, opened on first call
    pub fn bench(&mut self) -> Result<&mut TsBench> {
        if self.bench.is_none() {
            let bench = match &self.location {
                StoreLocation::Memory => TsBench::new_in_memory(),
                StoreLocation::Disk(path) => {
                    info!("Opening store at {:?}", path);
                    TsBench::new_persistent(path)?
                },
                StoreLocation::Influx(config) => {
                    info!("Connecting to InfluxDB at {}", config.url);
                    TsBench::new_influx(config.clone())?
                },
            };
            self.bench = Some(bench);
        }

        self.bench.as_mut().ok_or_else(|| anyhow!("store is not open"))
    }

    /// Configuration commands start from
    pub fn base_config(&self) -> &BenchConfig {
        &self.base
    }

    /// Current formatter
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Tokio runtime
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}
