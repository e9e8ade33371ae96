//! InfluxDB 1.x store for tsbench
//!
//! Talks to a running InfluxDB server over its HTTP API: statements go
//! to `/query`, points go to `/write` as line protocol with second
//! precision.

use std::collections::BTreeMap;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::core::point::{FieldValue, Point, Record};
use crate::core::errors::{Result, StoreError};
use crate::core::store::TimeSeriesStore;

/// Connection settings of an InfluxDB server
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8086`
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl InfluxConfig {
    pub fn new(url: impl Into<String>) -> Self {
        InfluxConfig {
            url: url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }
}

/// Body of a `/query` response
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    name: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Store backed by an InfluxDB server
pub struct InfluxStore {
    config: InfluxConfig,
    client: Client,
}

impl InfluxStore {
    /// Connect to the server, checking it answers `/ping`
    pub fn connect(config: InfluxConfig) -> Result<Self> {
        let store = InfluxStore {
            config,
            client: Client::new(),
        };

        let response = store.authed(store.client.get(store.endpoint("ping")))
            .send()
            .map_err(http_error)?;
        if !response.status().is_success() {
            return Err(StoreError::Internal(format!(
                "InfluxDB at {} answered ping with {}", store.config.url, response.status()
            )));
        }

        debug!("connected to InfluxDB at {}", store.config.url);
        Ok(store)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        }
    }

    /// Run a read statement (`SELECT`, `SHOW`)
    fn read(&self, database: Option<&str>, statement: &str) -> Result<Vec<Series>> {
        let mut params = vec![("q", statement), ("epoch", "s")];
        if let Some(db) = database {
            params.push(("db", db));
        }

        let response = self.authed(self.client.get(self.endpoint("query")))
            .query(&params)
            .send()
            .map_err(http_error)?;

        parse_query_response(database, check_status(database, response)?)
    }

    /// Run a mutating statement (`CREATE`, `DROP`)
    fn execute(&self, database: Option<&str>, statement: &str) -> Result<()> {
        let mut params = vec![("q", statement)];
        if let Some(db) = database {
            params.push(("db", db));
        }

        let response = self.authed(self.client.post(self.endpoint("query")))
            .query(&params)
            .send()
            .map_err(http_error)?;

        parse_query_response(database, check_status(database, response)?)?;
        Ok(())
    }

    fn write_lines(&self, database: &str, lines: String) -> Result<()> {
        let response = self.authed(self.client.post(self.endpoint("write")))
            .query(&[("db", database), ("precision", "s")])
            .body(lines)
            .send()
            .map_err(http_error)?;

        check_status(Some(database), response)?;
        Ok(())
    }
}

impl TimeSeriesStore for InfluxStore {
    fn list_databases(&self) -> Result<Vec<String>> {
        let series = self.read(None, "SHOW DATABASES")?;

        Ok(series.into_iter()
            .flat_map(|s| s.values)
            .filter_map(|row| row.first().and_then(|v| v.as_str()).map(str::to_string))
            .collect())
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(StoreError::InvalidOperation("Database name cannot be empty".to_string()));
        }

        // CREATE DATABASE is idempotent on the server side
        self.execute(None, &format!("CREATE DATABASE {}", quote_ident(name)))
    }

    fn delete_database(&mut self, name: &str) -> Result<()> {
        if !self.database_exists(name)? {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }

        self.execute(None, &format!("DROP DATABASE {}", quote_ident(name)))
    }

    fn write_point(&mut self, database: &str, point: Point) -> Result<()> {
        self.write_lines(database, line_protocol(&point))
    }

    fn write_points(&mut self, database: &str, points: Vec<Point>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body = points.iter()
            .map(line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        self.write_lines(database, body)
    }

    fn query(&self, database: &str, query: &str) -> Result<Vec<Record>> {
        let series = self.read(Some(database), query)?;
        series_to_records(series)
    }

    fn drop_measurement(&mut self, database: &str, measurement: &str) -> Result<()> {
        self.execute(Some(database), &format!("DROP MEASUREMENT {}", quote_ident(measurement)))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

fn http_error(e: reqwest::Error) -> StoreError {
    StoreError::Internal(format!("InfluxDB request failed: {}", e))
}

/// Map HTTP failures to store errors; a 404 means the database is missing
fn check_status(database: Option<&str>, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    match (status, database) {
        (StatusCode::NOT_FOUND, Some(db)) => Err(StoreError::DatabaseNotFound(db.to_string())),
        (StatusCode::BAD_REQUEST, _) => Err(StoreError::Query(body)),
        _ => Err(StoreError::Internal(format!("InfluxDB answered {}: {}", status, body))),
    }
}

fn parse_query_response(database: Option<&str>, response: Response) -> Result<Vec<Series>> {
    let body = response.text().map_err(http_error)?;
    parse_query_body(database, &body)
}

fn parse_query_body(database: Option<&str>, body: &str) -> Result<Vec<Series>> {
    let parsed: QueryResponse = serde_json::from_str(body)
        .map_err(|e| StoreError::DeserializationError(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(StoreError::Query(error));
    }

    let mut series = Vec::new();
    for result in parsed.results {
        if let Some(error) = result.error {
            return Err(match database {
                Some(db) if error.starts_with("database not found") => {
                    StoreError::DatabaseNotFound(db.to_string())
                },
                _ => StoreError::Query(error),
            });
        }
        series.extend(result.series);
    }

    Ok(series)
}

/// Turn query series into records; the `time` column becomes the timestamp
fn series_to_records(series: Vec<Series>) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for s in series {
        let time_index = s.columns.iter().position(|c| c == "time");

        for row in s.values {
            let mut record = Record {
                measurement: s.name.clone(),
                timestamp: 0,
                fields: BTreeMap::new(),
                tags: s.tags.clone(),
            };

            for (i, (column, value)) in s.columns.iter().zip(row).enumerate() {
                if Some(i) == time_index {
                    record.timestamp = value.as_i64().ok_or_else(|| {
                        StoreError::DeserializationError(format!("bad time value: {}", value))
                    })?;
                } else if let Some(field) = field_from_json(value) {
                    record.fields.insert(column.clone(), field);
                }
            }

            records.push(record);
        }
    }

    Ok(records)
}

fn field_from_json(value: serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::Bool(b) => Some(FieldValue::Boolean(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(FieldValue::Integer(i)),
            None => n.as_f64().map(FieldValue::Float),
        },
        serde_json::Value::String(s) => Some(FieldValue::String(s)),
        _ => None,
    }
}

/// Encode a point as one line of InfluxDB line protocol
pub fn line_protocol(point: &Point) -> String {
    let mut line = escape(&point.measurement, &[',', ' ']);

    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    let fields: Vec<String> = point.fields.iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), field_literal(value)))
        .collect();
    line.push(' ');
    line.push_str(&fields.join(","));

    if let Some(ts) = point.timestamp {
        line.push(' ');
        line.push_str(&ts.to_string());
    }

    line
}

fn field_literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(f) => {
            // An integral float without a decimal point would be read as an integer column
            if f.fract() == 0.0 && f.is_finite() {
                format!("{:.1}", f)
            } else {
                f.to_string()
            }
        },
        FieldValue::Integer(i) => format!("{}i", i),
        FieldValue::String(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
        FieldValue::Boolean(b) => b.to_string(),
    }
}

fn escape(input: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
