//! Query executor
//!
//! Stores hand their records for a database to `execute` in insertion
//! order; the executor filters, orders, limits and projects them.

use crate::core::point::Record;
use crate::ql::ast::{SelectQuery, Projection, Order};

/// Execute a parsed query over the records of one database
pub fn execute<I>(records: I, query: &SelectQuery) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut matching: Vec<Record> = records.into_iter()
        .filter(|r| r.measurement == query.measurement)
        .filter(|r| query.conditions.iter().all(|c| c.matches(r.timestamp)))
        .collect();

    // Stable sorts keep insertion order among equal timestamps
    match query.order {
        Some(Order::Asc) => matching.sort_by_key(|r| r.timestamp),
        Some(Order::Desc) => matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        None => {}
    }

    if let Some(limit) = query.limit {
        matching.truncate(limit);
    }

    if let Projection::Fields(fields) = &query.projection {
        for record in &mut matching {
            record.fields.retain(|name, _| fields.iter().any(|f| f == name));
        }
    }

    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::point::Point;
    use crate::ql::parser::parse_query;

    fn sample() -> Vec<Record> {
        vec![
            Point::new("cpu").field("a", 1i64).field("b", 2i64).timestamp(30).into_record(0),
            Point::new("mem").field("a", 9i64).timestamp(10).into_record(0),
            Point::new("cpu").field("a", 3i64).field("b", 4i64).timestamp(10).into_record(0),
            Point::new("cpu").field("a", 5i64).field("b", 6i64).timestamp(20).into_record(0),
        ]
    }

    #[test]
    fn test_filters_measurement_in_insertion_order() {
        let query = parse_query("SELECT * FROM cpu").unwrap();
        let result = execute(sample(), &query);
        let times: Vec<i64> = result.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![30, 10, 20]);
    }

    #[test]
    fn test_conditions_order_and_limit() {
        let query = parse_query("SELECT * FROM cpu WHERE time > 10 ORDER BY time ASC LIMIT 1").unwrap();
        let result = execute(sample(), &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].timestamp, 20);
    }

    #[test]
    fn test_projection_keeps_listed_fields() {
        let query = parse_query("SELECT b FROM cpu ORDER BY time DESC").unwrap();
        let result = execute(sample(), &query);
        assert_eq!(result[0].timestamp, 30);
        assert!(result.iter().all(|r| r.fields.len() == 1 && r.get("b").is_some()));
    }
}
