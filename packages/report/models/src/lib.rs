#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime tally and report output types.
//!
//! A [`CrimeTally`] is the ranked list of `(category, count)` rows returned
//! by an aggregate query. It is built once per request, handed to the
//! formatter, and discarded.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One aggregated row: a crime category and the number of incidents in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TallyRow {
    /// Category label as reported by the data source (e.g., `"THEFT"`).
    pub category: String,
    /// Number of incidents in this category.
    pub count: u64,
}

impl TallyRow {
    /// Creates a new row.
    #[must_use]
    pub fn new(category: impl Into<String>, count: u64) -> Self {
        Self {
            category: category.into(),
            count,
        }
    }
}

/// Ordered sequence of tally rows, in the order the remote service returned
/// them (descending by count for the standard query).
///
/// No local deduplication or re-sorting is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrimeTally {
    rows: Vec<TallyRow>,
}

impl CrimeTally {
    /// Creates an empty tally.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Appends a row, preserving insertion order.
    pub fn push(&mut self, row: TallyRow) {
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows were obtained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in rank order.
    #[must_use]
    pub fn rows(&self) -> &[TallyRow] {
        &self.rows
    }

    /// Drops every row past `limit`, returning how many were removed.
    pub fn truncate_to(&mut self, limit: usize) -> usize {
        let excess = self.rows.len().saturating_sub(limit);
        self.rows.truncate(limit);
        excess
    }

    /// Sum of all row counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

impl From<Vec<TallyRow>> for CrimeTally {
    fn from(rows: Vec<TallyRow>) -> Self {
        Self { rows }
    }
}

impl FromIterator<TallyRow> for CrimeTally {
    fn from_iter<I: IntoIterator<Item = TallyRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CrimeTally {
    type Item = &'a TallyRow;
    type IntoIter = std::slice::Iter<'a, TallyRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// How a report is rendered for output.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputFormat {
    /// Fixed-width ranked table.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn truncate_to_drops_excess_rows() {
        let mut tally: CrimeTally = (0..5)
            .map(|i| TallyRow::new(format!("TYPE {i}"), 100 - i))
            .collect();
        assert_eq!(tally.truncate_to(3), 2);
        assert_eq!(tally.len(), 3);
        assert_eq!(tally.rows()[2].category, "TYPE 2");
    }

    #[test]
    fn truncate_to_is_noop_below_limit() {
        let mut tally = CrimeTally::from(vec![TallyRow::new("THEFT", 500)]);
        assert_eq!(tally.truncate_to(10), 0);
        assert_eq!(tally.len(), 1);
    }

    #[test]
    fn total_sums_counts() {
        let tally = CrimeTally::from(vec![
            TallyRow::new("THEFT", 500),
            TallyRow::new("BATTERY", 300),
        ]);
        assert_eq!(tally.total(), 800);
    }

    #[test]
    fn tally_serializes_as_plain_array() {
        let tally = CrimeTally::from(vec![TallyRow::new("THEFT", 500)]);
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"[{"category":"THEFT","count":500}]"#);
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("TEXT").unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_str("xml").is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn output_format_parse_error_is_std_error() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            OutputFormat::from_str("xml").unwrap_err().into();
        assert!(!err.to_string().is_empty());
    }
}
