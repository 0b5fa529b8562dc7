//! Report rendering.
//!
//! The text form is a fixed-width ranked table:
//!
//! ```text
//! Top 2 crime types in Chicago:
//!  1. THEFT                             500
//!  2. BATTERY                           300
//!
//! Download time: 184 ms
//! ```
//!
//! When no rows were parsed, a snippet of the raw body is appended so an
//! unexpected response shape can be diagnosed from the output alone.

use std::fmt::Write as _;
use std::time::Duration;

use crime_report_models::{CrimeTally, OutputFormat, TallyRow};
use serde::Serialize;

use crate::ReportError;

/// Maximum number of characters of the raw body shown in the diagnostic.
pub const SNIPPET_LEN: usize = 500;

/// A fetched tally plus everything needed to render it.
#[derive(Debug, Clone)]
pub struct Report {
    /// City name for the header line.
    pub city: String,
    /// Parsed rows.
    pub tally: CrimeTally,
    /// Decoded response body the rows were parsed from.
    pub raw_body: String,
    /// Measured transfer time.
    pub elapsed: Duration,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    city: &'a str,
    count: usize,
    rows: Vec<JsonRow<'a>>,
    download_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_snippet: Option<String>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    rank: usize,
    category: &'a str,
    count: u64,
}

impl Report {
    /// Creates a report.
    #[must_use]
    pub const fn new(city: String, tally: CrimeTally, raw_body: String, elapsed: Duration) -> Self {
        Self {
            city,
            tally,
            raw_body,
            elapsed,
        }
    }

    /// Transfer time in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Renders the report in the requested format.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if JSON serialization fails.
    pub fn render(&self, format: OutputFormat) -> Result<String, ReportError> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => self.render_json(),
        }
    }

    /// Renders the fixed-width text table.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Top {} crime types in {}:\n",
            self.tally.len(),
            self.city
        );

        for (index, row) in self.tally.rows().iter().enumerate() {
            out.push_str(&format_row(index + 1, row));
        }

        if self.tally.is_empty() {
            write!(
                out,
                "\n(Parsing produced 0 items - raw response snippet below)\n{}\n",
                snippet(&self.raw_body, SNIPPET_LEN)
            )
            .unwrap();
        }

        write!(out, "\nDownload time: {} ms\n", self.elapsed_ms()).unwrap();
        out
    }

    /// Renders a pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization fails.
    pub fn render_json(&self) -> Result<String, ReportError> {
        let report = JsonReport {
            city: &self.city,
            count: self.tally.len(),
            rows: self
                .tally
                .rows()
                .iter()
                .enumerate()
                .map(|(index, row)| JsonRow {
                    rank: index + 1,
                    category: &row.category,
                    count: row.count,
                })
                .collect(),
            download_time_ms: self.elapsed_ms(),
            raw_snippet: self
                .tally
                .is_empty()
                .then(|| snippet(&self.raw_body, SNIPPET_LEN)),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render_text())
    }
}

/// Formats one table line: rank right-aligned in 2 columns, category
/// left-aligned in 30, count right-aligned in 6.
#[must_use]
pub fn format_row(rank: usize, row: &TallyRow) -> String {
    format!("{rank:>2}. {:<30} {:>6}\n", row.category, row.count)
}

/// First `max_chars` characters of `body`, with `...` appended if anything
/// was cut.
#[must_use]
pub fn snippet(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
