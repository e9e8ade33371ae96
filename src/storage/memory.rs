//! In-memory store for tsbench
//!
//! This module provides a simple in-memory implementation of the
//! time-series store, mapping database names to their records.

use std::collections::HashMap;
use chrono::Utc;

use crate::core::point::{Point, Record};
use crate::core::errors::{Result, StoreError};
use crate::core::store::TimeSeriesStore;
use crate::ql;

/// An in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Map of database names to records in insertion order
    databases: HashMap<String, Vec<Record>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        MemoryStore {
            databases: HashMap::new(),
        }
    }

    /// Number of records held by a database
    pub fn len(&self, database: &str) -> Result<usize> {
        self.databases.get(database)
            .map(|records| records.len())
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))
    }

    fn records_mut(&mut self, database: &str) -> Result<&mut Vec<Record>> {
        self.databases.get_mut(database)
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))
    }
}

impl TimeSeriesStore for MemoryStore {
    fn list_databases(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(StoreError::InvalidOperation("Database name cannot be empty".to_string()));
        }

        self.databases.entry(name.to_string()).or_default();
        Ok(())
    }

    fn delete_database(&mut self, name: &str) -> Result<()> {
        if self.databases.remove(name).is_none() {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }

        Ok(())
    }

    fn write_point(&mut self, database: &str, point: Point) -> Result<()> {
        let now = Utc::now().timestamp();
        self.records_mut(database)?.push(point.into_record(now));
        Ok(())
    }

    fn write_points(&mut self, database: &str, points: Vec<Point>) -> Result<()> {
        let now = Utc::now().timestamp();
        let records = self.records_mut(database)?;
        records.extend(points.into_iter().map(|p| p.into_record(now)));
        Ok(())
    }

    fn query(&self, database: &str, query: &str) -> Result<Vec<Record>> {
        let records = self.databases.get(database)
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))?;

        ql::execute_query(records.iter().cloned(), query)
    }

    fn drop_measurement(&mut self, database: &str, measurement: &str) -> Result<()> {
        self.records_mut(database)?.retain(|r| r.measurement != measurement);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // No-op for in-memory store
        Ok(())
    }
}
