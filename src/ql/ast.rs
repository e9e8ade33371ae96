//! Abstract Syntax Tree for store queries
//!
//! This module defines the structures that represent a parsed query.

/// A parsed `SELECT` query
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// Fields to return
    pub projection: Projection,
    /// Measurement to read from
    pub measurement: String,
    /// Time conditions, all of which must hold
    pub conditions: Vec<TimeCondition>,
    /// Ordering; insertion order when absent
    pub order: Option<Order>,
    /// Maximum number of records to return
    pub limit: Option<usize>,
}

/// Fields selected by a query
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`
    All,
    /// An explicit field list
    Fields(Vec<String>),
}

/// A comparison against the record timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeCondition {
    pub op: Comparison,
    pub value: i64,
}

impl TimeCondition {
    /// Check whether a timestamp satisfies the condition
    pub fn matches(&self, timestamp: i64) -> bool {
        match self.op {
            Comparison::Eq => timestamp == self.value,
            Comparison::NotEq => timestamp != self.value,
            Comparison::Lt => timestamp < self.value,
            Comparison::LtEq => timestamp <= self.value,
            Comparison::Gt => timestamp > self.value,
            Comparison::GtEq => timestamp >= self.value,
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Time ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}
