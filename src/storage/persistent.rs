use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sled::{Db, Tree};
use bincode::{serialize, deserialize};
use log::debug;

use crate::core::point::{Point, Record};
use crate::core::errors::{Result, StoreError};
use crate::core::store::TimeSeriesStore;
use crate::ql::{parser, executor};

/// Tree listing the databases that exist
const CATALOG_TREE: &str = "__catalog";

/// Prefix of the tree holding one database's records
const DATABASE_TREE_PREFIX: &str = "db:";

/// A persistent store using sled
///
/// Every database is its own sled tree. Record keys are big-endian ids
/// from `Db::generate_id`, so iteration order is insertion order.
pub struct PersistentStore {
    /// The underlying sled database
    db: Arc<Db>,
    /// Names of existing databases
    catalog: Tree,
}

impl PersistentStore {
    /// Open a persistent store at the given path
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let db = sled::open(path.into())
            .map_err(|e| StoreError::Internal(format!("Failed to open database: {}", e)))?;

        let catalog = db.open_tree(CATALOG_TREE)
            .map_err(|e| StoreError::Internal(format!("Failed to open catalog: {}", e)))?;

        Ok(PersistentStore {
            db: Arc::new(db),
            catalog,
        })
    }

    fn tree_name(database: &str) -> String {
        format!("{}{}", DATABASE_TREE_PREFIX, database)
    }

    /// Open the record tree of an existing database
    fn tree(&self, database: &str) -> Result<Tree> {
        let exists = self.catalog.contains_key(database.as_bytes())
            .map_err(|e| StoreError::Internal(format!("Failed to read catalog: {}", e)))?;

        if !exists {
            return Err(StoreError::DatabaseNotFound(database.to_string()));
        }

        self.db.open_tree(Self::tree_name(database))
            .map_err(|e| StoreError::Internal(format!("Failed to open tree: {}", e)))
    }

    fn encode(&self, point: Point, now: i64) -> Result<(Vec<u8>, Vec<u8>)> {
        let id = self.db.generate_id()
            .map_err(|e| StoreError::Internal(format!("Failed to generate id: {}", e)))?;

        let record = point.into_record(now);
        let value_bytes = serialize(&record)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        Ok((id.to_be_bytes().to_vec(), value_bytes))
    }

    /// Read every record of a database in insertion order
    fn scan(&self, tree: &Tree) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for item in tree.iter() {
            let (_, value_bytes) = item
                .map_err(|e| StoreError::Internal(format!("Failed to iterate database: {}", e)))?;

            let record: Record = deserialize(&value_bytes)
                .map_err(|e| StoreError::DeserializationError(e.to_string()))?;

            records.push(record);
        }

        Ok(records)
    }
}

impl TimeSeriesStore for PersistentStore {
    fn list_databases(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for item in self.catalog.iter() {
            let (key, _) = item
                .map_err(|e| StoreError::Internal(format!("Failed to read catalog: {}", e)))?;

            let name = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::DeserializationError(e.to_string()))?;

            names.push(name);
        }

        Ok(names)
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(StoreError::InvalidOperation("Database name cannot be empty".to_string()));
        }

        self.catalog.insert(name.as_bytes(), &[] as &[u8])
            .map_err(|e| StoreError::Internal(format!("Failed to create database: {}", e)))?;

        debug!("PersistentStore: created database {}", name);
        Ok(())
    }

    fn delete_database(&mut self, name: &str) -> Result<()> {
        let removed = self.catalog.remove(name.as_bytes())
            .map_err(|e| StoreError::Internal(format!("Failed to delete database: {}", e)))?;

        if removed.is_none() {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }

        self.db.drop_tree(Self::tree_name(name))
            .map_err(|e| StoreError::Internal(format!("Failed to drop tree: {}", e)))?;

        debug!("PersistentStore: deleted database {}", name);
        Ok(())
    }

    fn write_point(&mut self, database: &str, point: Point) -> Result<()> {
        let tree = self.tree(database)?;
        let (key, value) = self.encode(point, Utc::now().timestamp())?;

        tree.insert(key, value)
            .map_err(|e| StoreError::Internal(format!("Failed to insert data: {}", e)))?;

        Ok(())
    }

    fn write_points(&mut self, database: &str, points: Vec<Point>) -> Result<()> {
        let tree = self.tree(database)?;
        let now = Utc::now().timestamp();

        // One atomic sled batch per call
        let mut batch = sled::Batch::default();
        for point in points {
            let (key, value) = self.encode(point, now)?;
            batch.insert(key, value);
        }

        tree.apply_batch(batch)
            .map_err(|e| StoreError::Internal(format!("Failed to insert batch: {}", e)))?;

        Ok(())
    }

    fn query(&self, database: &str, query: &str) -> Result<Vec<Record>> {
        // Parse first so a bad query never scans the tree
        let parsed = parser::parse_query(query)?;
        let tree = self.tree(database)?;
        let records = self.scan(&tree)?;

        Ok(executor::execute(records, &parsed))
    }

    fn drop_measurement(&mut self, database: &str, measurement: &str) -> Result<()> {
        let tree = self.tree(database)?;
        let mut batch = sled::Batch::default();
        let mut dropped = 0usize;

        for item in tree.iter() {
            let (key, value_bytes) = item
                .map_err(|e| StoreError::Internal(format!("Failed to iterate database: {}", e)))?;

            let record: Record = deserialize(&value_bytes)
                .map_err(|e| StoreError::DeserializationError(e.to_string()))?;

            if record.measurement == measurement {
                batch.remove(key);
                dropped += 1;
            }
        }

        tree.apply_batch(batch)
            .map_err(|e| StoreError::Internal(format!("Failed to drop measurement: {}", e)))?;

        debug!("PersistentStore: dropped {} records of {} in {}", dropped, measurement, database);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()
            .map_err(|e| StoreError::Internal(format!("Failed to flush database: {}", e)))?;

        Ok(())
    }
}
