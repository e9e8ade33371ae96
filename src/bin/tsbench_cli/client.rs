//! HTTP client for a tsbench server

use anyhow::{Result, anyhow};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tsbench::Report;

use crate::utils::error::CliError;

/// Server response envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Error message, if any
    pub error: Option<String>,
    /// Response data
    pub data: Option<T>,
}

/// Client for a tsbench server
pub struct BenchClient {
    /// Server URL, without trailing slash
    server_url: String,
    http_client: HttpClient,
}

impl BenchClient {
    pub fn new(server_url: &str) -> Self {
        BenchClient {
            server_url: server_url.trim_end_matches('/').to_string(),
            http_client: HttpClient::new(),
        }
    }

    /// Check that the server answers on `/health`
    pub async fn check_connection(&self) -> Result<()> {
        let url = format!("{}/health", self.server_url);

        let response = self.http_client.get(&url)
            .send()
            .await
            .map_err(|e| CliError::Connection(format!("{}: {}", url, e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CliError::Connection(format!("{} answered {}", url, response.status())).into())
        }
    }

    /// Ask the server to run a benchmark and return its report
    pub async fn fetch_report(&self, points: Option<usize>, batch_sizes: Option<&str>) -> Result<Report> {
        let url = format!("{}/reports", self.server_url);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(points) = points {
            params.push(("points", points.to_string()));
        }
        if let Some(sizes) = batch_sizes {
            params.push(("batch_sizes", sizes.to_string()));
        }

        let response: ApiResponse<Report> = self.http_client.get(&url)
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        if response.success {
            response.data.ok_or_else(|| anyhow!("No report returned"))
        } else {
            Err(anyhow!(response.error.unwrap_or_else(|| "Unknown error".to_string())))
        }
    }
}
