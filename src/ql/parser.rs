//! Parser for store queries
//!
//! This module turns query strings into a `SelectQuery`.

use pest::Parser;
use pest_derive::Parser;
use pest::iterators::Pair;

use crate::core::errors::{Result, StoreError};
use crate::ql::ast::{SelectQuery, Projection, TimeCondition, Comparison, Order};

#[derive(Parser)]
#[grammar = "ql/grammar.pest"]
pub struct TsQueryParser;

pub fn parse_query(input: &str) -> Result<SelectQuery> {
    let mut pairs = TsQueryParser::parse(Rule::main, input)
        .map_err(|e| StoreError::Query(format!("Parse error: {}", e)))?;

    let main = pairs.next()
        .ok_or_else(|| StoreError::Query("Empty query".to_string()))?;

    let select = main.into_inner()
        .find(|p| p.as_rule() == Rule::select_stmt)
        .ok_or_else(|| StoreError::Query("Missing SELECT statement".to_string()))?;

    parse_select(select)
}

fn parse_select(pair: Pair<Rule>) -> Result<SelectQuery> {
    let mut projection = Projection::All;
    let mut measurement = None;
    let mut conditions = Vec::new();
    let mut order = None;
    let mut limit = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::projection => projection = parse_projection(part)?,
            Rule::measurement => measurement = Some(parse_measurement(part)?),
            Rule::where_clause => {
                for condition in part.into_inner() {
                    conditions.push(parse_condition(condition)?);
                }
            },
            Rule::order_clause => {
                // ORDER BY time without a direction is ascending
                order = Some(match part.into_inner().next() {
                    Some(dir) if dir.as_str().eq_ignore_ascii_case("desc") => Order::Desc,
                    _ => Order::Asc,
                });
            },
            Rule::limit_clause => {
                let value = first_inner(part)?;
                let n = value.as_str().parse::<usize>()
                    .map_err(|_| StoreError::Query(format!("Invalid limit: {}", value.as_str())))?;
                limit = Some(n);
            },
            _ => {}
        }
    }

    let measurement = measurement
        .ok_or_else(|| StoreError::Query("Missing measurement".to_string()))?;

    Ok(SelectQuery {
        projection,
        measurement,
        conditions,
        order,
        limit,
    })
}

fn parse_projection(pair: Pair<Rule>) -> Result<Projection> {
    let inner = first_inner(pair)?;

    match inner.as_rule() {
        Rule::star => Ok(Projection::All),
        Rule::field_list => {
            let fields = inner.into_inner()
                .map(|f| f.as_str().to_string())
                .collect();
            Ok(Projection::Fields(fields))
        },
        rule => Err(StoreError::Query(format!("Unexpected projection: {:?}", rule))),
    }
}

fn parse_measurement(pair: Pair<Rule>) -> Result<String> {
    let inner = first_inner(pair)?;

    match inner.as_rule() {
        Rule::quoted_identifier => Ok(first_inner(inner)?.as_str().to_string()),
        Rule::identifier => Ok(inner.as_str().to_string()),
        rule => Err(StoreError::Query(format!("Unexpected measurement: {:?}", rule))),
    }
}

fn parse_condition(pair: Pair<Rule>) -> Result<TimeCondition> {
    let mut inner = pair.into_inner();
    let op_pair = inner.next()
        .ok_or_else(|| StoreError::Query("Missing comparison".to_string()))?;
    let value_pair = inner.next()
        .ok_or_else(|| StoreError::Query("Missing time value".to_string()))?;

    let op = match op_pair.as_str() {
        "=" => Comparison::Eq,
        "!=" => Comparison::NotEq,
        "<" => Comparison::Lt,
        "<=" => Comparison::LtEq,
        ">" => Comparison::Gt,
        ">=" => Comparison::GtEq,
        other => return Err(StoreError::Query(format!("Unknown comparison: {}", other))),
    };

    let value = value_pair.as_str().parse::<i64>()
        .map_err(|_| StoreError::Query(format!("Invalid time value: {}", value_pair.as_str())))?;

    Ok(TimeCondition { op, value })
}

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>> {
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| StoreError::Query(format!("Empty {:?}", rule)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_all_quoted() {
        let query = parse_query(r#"SELECT * FROM "reports""#).unwrap();
        assert_eq!(query.projection, Projection::All);
        assert_eq!(query.measurement, "reports");
        assert!(query.conditions.is_empty());
        assert_eq!(query.order, None);
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_parse_full_query() {
        let query = parse_query(
            "select temperature, wind_speed from 10 where time >= 5 and time < 20 order by time desc limit 3;"
        ).unwrap();

        assert_eq!(
            query.projection,
            Projection::Fields(vec!["temperature".to_string(), "wind_speed".to_string()])
        );
        assert_eq!(query.measurement, "10");
        assert_eq!(query.conditions, vec![
            TimeCondition { op: Comparison::GtEq, value: 5 },
            TimeCondition { op: Comparison::Lt, value: 20 },
        ]);
        assert_eq!(query.order, Some(Order::Desc));
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_order_defaults_to_ascending() {
        let query = parse_query("SELECT * FROM cpu ORDER BY time").unwrap();
        assert_eq!(query.order, Some(Order::Asc));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_query("SELECT FROM reports"), Err(StoreError::Query(_))));
        assert!(matches!(parse_query("DELETE * FROM reports"), Err(StoreError::Query(_))));
        assert!(matches!(parse_query(""), Err(StoreError::Query(_))));
    }
}
