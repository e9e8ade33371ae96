//! Query language for tsbench stores
//!
//! Stores accept a small `SELECT` dialect: a projection, a measurement,
//! optional time conditions, ordering and a limit.

pub mod ast;
pub mod parser;
pub mod executor;

use crate::core::errors::Result;
use crate::core::point::Record;

/// Parse a query string and run it over the given records
pub fn execute_query<I>(records: I, query_str: &str) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = Record>,
{
    let query = parser::parse_query(query_str)?;

    Ok(executor::execute(records, &query))
}
