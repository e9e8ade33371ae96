use std::fmt::Write;

use anyhow::Result;
use colored::*;
use tsbench::{AggregatedHistory, Bucket, Record, Report};
use tsbench::bench::format::{display_opt, to_millis};

use crate::formatters::Formatter;

/// Plain text formatter
pub struct TextFormatter {
    /// Whether colors are enabled
    colored: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        TextFormatter {
            colored: true,
        }
    }

    /// Formatter without colors
    #[allow(dead_code)]
    pub fn without_colors() -> Self {
        TextFormatter {
            colored: false,
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colored {
            format!("{}", text.bold())
        } else {
            text.to_string()
        }
    }

    fn history_lines(&self, out: &mut String, history: &AggregatedHistory) -> std::fmt::Result {
        writeln!(out, "{}", self.heading(&format!("Averages over {} runs", history.record_count)))?;
        for bucket in Bucket::ALL {
            let line = display_opt(history.average(bucket), to_millis, "ms");
            writeln!(out, "  batch size {}: {}", bucket, line)?;
        }
        writeln!(out, "  total: {} ms", to_millis(history.grand_total_s))
    }
}

impl Formatter for TextFormatter {
    fn format_report(&self, report: &Report) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "{}", self.heading(&format!("Run {}", report.run.run_id)))?;
        writeln!(out, "  started at {}", report.run.started_at.to_rfc3339())?;
        for result in &report.run.results {
            writeln!(out, "  {}", result)?;
        }
        writeln!(out, "  finished in {} ms", to_millis(report.elapsed_s))?;

        match &report.past_averages {
            Some(history) => self.history_lines(&mut out, history)?,
            None => writeln!(out, "{}", self.format_info("Not enough history to average"))?,
        }

        if let Some(error) = &report.history_error {
            writeln!(out, "{}", self.format_error(&format!("History unreadable: {}", error)))?;
        }

        Ok(out.trim_end().to_string())
    }

    fn format_history(&self, history: Option<&AggregatedHistory>) -> Result<String> {
        let mut out = String::new();
        match history {
            Some(history) => self.history_lines(&mut out, history)?,
            None => out.push_str(&self.format_info("Not enough history to average")),
        }
        Ok(out.trim_end().to_string())
    }

    fn format_records(&self, records: &[Record]) -> Result<String> {
        if records.is_empty() {
            return Ok(self.format_info("No records"));
        }
        Ok(records.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("\n"))
    }

    fn format_error(&self, error: &str) -> String {
        if self.colored {
            format!("{}", error.red().bold())
        } else {
            format!("Error: {}", error)
        }
    }

    fn format_info(&self, info: &str) -> String {
        if self.colored {
            format!("{}", info.blue())
        } else {
            format!("Info: {}", info)
        }
    }

    fn format_success(&self, success: &str) -> String {
        if self.colored {
            format!("{}", success.green().bold())
        } else {
            format!("Success: {}", success)
        }
    }
}
