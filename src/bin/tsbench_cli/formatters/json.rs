use anyhow::Result;
use colored::*;
use serde::Serialize;
use serde_json::json;
use tsbench::{AggregatedHistory, Record, Report};

use crate::formatters::Formatter;

/// JSON formatter
pub struct JsonFormatter {
    /// Whether output is indented
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter {
            pretty: true,
        }
    }

    /// Compact output
    #[allow(dead_code)]
    pub fn without_pretty() -> Self {
        JsonFormatter {
            pretty: false,
        }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_report(&self, report: &Report) -> Result<String> {
        self.render(report)
    }

    fn format_history(&self, history: Option<&AggregatedHistory>) -> Result<String> {
        self.render(&history)
    }

    fn format_records(&self, records: &[Record]) -> Result<String> {
        let rows: Vec<serde_json::Value> = records.iter().map(|r| r.to_json()).collect();
        self.render(&rows)
    }

    fn format_error(&self, error: &str) -> String {
        let value = json!({ "error": error });
        format!("{}", value.to_string().red())
    }

    fn format_info(&self, info: &str) -> String {
        json!({ "info": info }).to_string()
    }

    fn format_success(&self, success: &str) -> String {
        json!({ "success": success }).to_string()
    }
}
