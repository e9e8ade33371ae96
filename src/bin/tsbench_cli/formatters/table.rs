use anyhow::Result;
use colored::*;
use prettytable::{Table, Row, Cell};
use tsbench::{AggregatedHistory, Bucket, Record, Report};
use tsbench::bench::format::{display_opt, to_micros, to_millis};

use crate::formatters::Formatter;

/// Table formatter
pub struct TableFormatter {
    /// Whether colors are enabled
    colored: bool,
}

impl TableFormatter {
    pub fn new() -> Self {
        TableFormatter {
            colored: true,
        }
    }

    /// Formatter without colors
    #[allow(dead_code)]
    pub fn without_colors() -> Self {
        TableFormatter {
            colored: false,
        }
    }

    fn header(&self, titles: &[&str]) -> Row {
        Row::new(titles.iter().map(|t| {
            if self.colored {
                Cell::new(t).style_spec("bFc")
            } else {
                Cell::new(t)
            }
        }).collect())
    }

    fn history_table(&self, history: &AggregatedHistory) -> Table {
        let mut table = Table::new();
        table.add_row(self.header(&["Batch size", "Average", "Samples"]));

        for bucket in Bucket::ALL {
            let (average, samples) = match history.buckets.get(&bucket) {
                Some(avg) => (display_opt(avg.average_s, to_millis, "ms"), avg.samples),
                None => ("n/a".to_string(), 0),
            };
            table.add_row(Row::new(vec![
                Cell::new(&bucket.to_string()),
                Cell::new(&average),
                Cell::new(&samples.to_string()),
            ]));
        }

        table.add_row(Row::new(vec![
            Cell::new("total"),
            Cell::new(&format!("{} ms", to_millis(history.grand_total_s))),
            Cell::new(&history.record_count.to_string()),
        ]));

        table
    }
}

impl Formatter for TableFormatter {
    fn format_report(&self, report: &Report) -> Result<String> {
        let mut table = Table::new();
        table.add_row(self.header(&["Batch size", "Points", "Writes", "Total", "Per point", "Slowest write", "Drop"]));

        for result in &report.run.results {
            table.add_row(Row::new(vec![
                Cell::new(&result.batch_size.to_string()),
                Cell::new(&result.points.to_string()),
                Cell::new(&result.write_operations.to_string()),
                Cell::new(&format!("{} ms", to_millis(result.total_time_s))),
                Cell::new(&display_opt(result.time_per_point_s, to_micros, "µs")),
                Cell::new(&display_opt(result.slowest_write_s, to_micros, "µs")),
                Cell::new(&display_opt(result.drop_time_s, to_millis, "ms")),
            ]));
        }

        let mut out = format!("Run {}\n{}", report.run.run_id, table);

        match &report.past_averages {
            Some(history) => out.push_str(&self.history_table(history).to_string()),
            None => out.push_str(&self.format_info("Not enough history to average")),
        }

        if let Some(error) = &report.history_error {
            out.push('\n');
            out.push_str(&self.format_error(&format!("History unreadable: {}", error)));
        }

        Ok(out)
    }

    fn format_history(&self, history: Option<&AggregatedHistory>) -> Result<String> {
        match history {
            Some(history) => Ok(self.history_table(history).to_string()),
            None => Ok(self.format_info("Not enough history to average")),
        }
    }

    fn format_records(&self, records: &[Record]) -> Result<String> {
        if records.is_empty() {
            return Ok(self.format_info("No records"));
        }

        let mut table = Table::new();
        table.add_row(self.header(&["Measurement", "Time", "Tags", "Fields"]));

        for record in records {
            let tags = record.tags.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            let fields = record.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");

            table.add_row(Row::new(vec![
                Cell::new(&record.measurement),
                Cell::new(&record.timestamp.to_string()),
                Cell::new(&tags),
                Cell::new(&fields),
            ]));
        }

        Ok(table.to_string())
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
