use crate::core::point::{Point, Record};
use crate::core::errors::Result;

/// Trait defining the operations of a time-series store
pub trait TimeSeriesStore: Send {
    /// List the names of all databases
    fn list_databases(&self) -> Result<Vec<String>>;

    /// Create a database (no-op if it already exists)
    fn create_database(&mut self, name: &str) -> Result<()>;

    /// Delete a database and everything in it
    fn delete_database(&mut self, name: &str) -> Result<()>;

    /// Write a single point as one store operation
    fn write_point(&mut self, database: &str, point: Point) -> Result<()>;

    /// Write a batch of points as one store operation
    fn write_points(&mut self, database: &str, points: Vec<Point>) -> Result<()>;

    /// Run a query against a database; records come back in insertion order
    fn query(&self, database: &str, query: &str) -> Result<Vec<Record>>;

    /// Remove every record of a measurement
    fn drop_measurement(&mut self, database: &str, measurement: &str) -> Result<()>;

    /// Flush changes (for persistent stores)
    fn flush(&self) -> Result<()>;

    /// Check whether a database exists
    fn database_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_databases()?.iter().any(|db| db == name))
    }
}
