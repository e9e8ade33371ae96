//! HTTP server for tsbench
//!
//! Exposes the benchmark over HTTP: a request runs one benchmark against
//! the server's store and returns the report as JSON.

pub mod routes;

use std::net::{AddrParseError, SocketAddr};
use std::sync::{Arc, Mutex};

use log::info;
use warp::Filter;

use crate::TsBench;
use crate::bench::BenchConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
    /// Listening address
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3000,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// HTTP server running benchmarks on request
pub struct BenchServer {
    /// Benchmarked store; the lock keeps runs from overlapping
    tsbench: Arc<Mutex<TsBench>>,
    /// Configuration used when a request does not override it
    base: BenchConfig,
    /// Server configuration
    config: ServerConfig,
}

impl BenchServer {
    /// Create a server around the given store
    pub fn new(tsbench: TsBench, base: BenchConfig, config: ServerConfig) -> Self {
        BenchServer {
            tsbench: Arc::new(Mutex::new(tsbench)),
            base,
            config,
        }
    }

    /// Start the HTTP server
    pub async fn run(&self) -> Result<(), AddrParseError> {
        let addr = self.config.addr()?;

        let health_route = warp::path("health")
            .and(warp::get())
            .map(|| "tsbench server is running");

        let routes = health_route
            .or(routes::api_routes(Arc::clone(&self.tsbench), self.base.clone()))
            .with(warp::log("tsbench::server"));

        info!("tsbench server running at {}", addr);

        warp::serve(routes).run(addr).await;

        Ok(())
    }
}
