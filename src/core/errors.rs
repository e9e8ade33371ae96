//! Error types for tsbench
//!
//! This module defines the errors raised by the store layer and
//! by the benchmark runner built on top of it.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors that abort a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Write failed for batch size {batch_size} after {elapsed:?}: {source}")]
    WriteFailure {
        batch_size: usize,
        elapsed: Duration,
        #[source]
        source: StoreError,
    },

    #[error("Malformed history record (timestamp {timestamp}): {reason}")]
    MalformedHistory {
        timestamp: i64,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config file error: {0}")]
    Config(#[from] std::io::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Result type for benchmark operations
pub type BenchResult<T> = std::result::Result<T, BenchError>;
