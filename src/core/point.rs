//! Point module for tsbench
//!
//! This module defines the data written to and read from a time-series
//! store: typed field values, points to write and stored records.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

/// The different types of values a point field can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Floating point value
    Float(f64),
    /// Integer value
    Integer(i64),
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
}

impl FieldValue {
    /// Check if the value is a float
    pub fn is_float(&self) -> bool {
        matches!(self, FieldValue::Float(_))
    }

    /// Check if the value is an integer
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldValue::Integer(_))
    }

    /// Check if the value is a number (integer or float)
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Check if the value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, FieldValue::String(_))
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String view of the value, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a string representation of the value's type
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Float(_) => "float",
            FieldValue::Integer(_) => "integer",
            FieldValue::String(_) => "string",
            FieldValue::Boolean(_) => "boolean",
        }
    }

    /// Convert to a JSON value for output
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Float(f) => serde_json::json!(f),
            FieldValue::Integer(i) => serde_json::json!(i),
            FieldValue::String(s) => serde_json::json!(s),
            FieldValue::Boolean(b) => serde_json::json!(b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Integer(i) => write!(f, "{}i", i),
            FieldValue::String(s) => write!(f, "\"{}\"", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

/// A point to be written to a measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Measurement (series) name
    pub measurement: String,
    /// Field values
    pub fields: BTreeMap<String, FieldValue>,
    /// Tag values
    pub tags: BTreeMap<String, String>,
    /// Epoch seconds; the store stamps the write time when absent
    pub timestamp: Option<i64>,
}

impl Point {
    /// Create an empty point for the given measurement
    pub fn new(measurement: impl Into<String>) -> Self {
        Point {
            measurement: measurement.into(),
            fields: BTreeMap::new(),
            tags: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Add a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Add a tag
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Set an explicit timestamp
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Turn the point into a stored record, using `now` when no timestamp is set
    pub fn into_record(self, now: i64) -> Record {
        Record {
            measurement: self.measurement,
            timestamp: self.timestamp.unwrap_or(now),
            fields: self.fields,
            tags: self.tags,
        }
    }
}

/// A point as stored and returned by queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub measurement: String,
    /// Epoch seconds
    pub timestamp: i64,
    pub fields: BTreeMap<String, FieldValue>,
    pub tags: BTreeMap<String, String>,
}

impl Record {
    /// Get a field by name
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Convert to a flat JSON object (`time`, tags, then fields)
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("time".to_string(), serde_json::json!(self.timestamp));
        for (k, v) in &self.tags {
            map.insert(k.clone(), serde_json::json!(v));
        }
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.measurement)?;
        for (k, v) in &self.tags {
            write!(f, ",{}={}", k, v)?;
        }
        let fields: Vec<String> = self.fields.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, " {} {}", fields.join(","), self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_types() {
        let float = FieldValue::Float(3.5);
        let integer = FieldValue::Integer(42);
        let string = FieldValue::String("working".to_string());
        let boolean = FieldValue::Boolean(true);

        assert!(float.is_float());
        assert!(integer.is_integer());
        assert!(integer.is_number());
        assert!(string.is_string());
        assert!(!boolean.is_number());
        assert_eq!(integer.as_f64(), Some(42.0));
        assert_eq!(string.as_str(), Some("working"));
    }

    #[test]
    fn test_point_into_record() {
        let point = Point::new("10")
            .field("temperature", 40i64)
            .tag("sensor_id", "sensor_1");
        let record = point.clone().into_record(1_700_000_000);
        assert_eq!(record.timestamp, 1_700_000_000);

        let stamped = point.timestamp(5).into_record(1_700_000_000);
        assert_eq!(stamped.timestamp, 5);
    }

    #[test]
    fn test_record_display() {
        let record = Point::new("cpu")
            .field("value", 1.5)
            .tag("host", "a")
            .timestamp(10)
            .into_record(0);
        assert_eq!(record.to_string(), "cpu,host=a value=1.5 10");
    }
}
