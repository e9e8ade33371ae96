use anyhow::Result;
use tsbench::{AggregatedHistory, Record, Report};

/// Output formatter
pub trait Formatter {
    /// Format the report of one run
    fn format_report(&self, report: &Report) -> Result<String>;

    /// Format history averages; `None` when there is not enough history
    fn format_history(&self, history: Option<&AggregatedHistory>) -> Result<String>;

    /// Format query results
    fn format_records(&self, records: &[Record]) -> Result<String>;

    fn format_error(&self, error: &str) -> String;

    fn format_info(&self, info: &str) -> String;

    fn format_success(&self, success: &str) -> String;
}
