//! SODA aggregate query construction.
//!
//! Builds `{base}/{dataset}.json?$select=..&$group=..&$order=..&$limit=..`
//! URLs. Every value is form-urlencoded on its own before being joined, so
//! spaces, commas, quotes and parentheses in SoQL expressions never produce
//! a malformed query string.

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime};

use crate::ReportError;
use crate::config::ReportConfig;

/// Default number of rows requested.
pub const DEFAULT_LIMIT: u32 = 10;

/// Default calendar year for the date filter.
pub const DEFAULT_YEAR: i32 = 2024;

/// Column holding the incident timestamp.
const DATE_COLUMN: &str = "date";

/// Timestamp format used in SoQL literals.
const SOQL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Inclusive timestamp range used for the `$where` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First instant included.
    pub start: NaiveDateTime,
    /// Last instant included.
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Covers `YYYY-01-01T00:00:00` through `YYYY-12-31T23:59:59`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if `year` is outside the supported
    /// date range.
    pub fn calendar_year(year: i32) -> Result<Self, ReportError> {
        let invalid = || ReportError::Config {
            message: format!("invalid year: {year}"),
        };
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .ok_or_else(invalid)?;
        Ok(Self { start, end })
    }

    /// Renders `{column} between '{start}' and '{end}'`.
    #[must_use]
    pub fn to_where_clause(&self, column: &str) -> String {
        format!(
            "{column} between '{}' and '{}'",
            self.start.format(SOQL_DATETIME_FORMAT),
            self.end.format(SOQL_DATETIME_FORMAT),
        )
    }
}

/// An aggregate query over a SODA dataset. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyQuery {
    /// `$select` expression.
    pub select: String,
    /// `$group` expression.
    pub group: String,
    /// `$order` expression.
    pub order: String,
    /// `$limit` value.
    pub limit: u32,
    /// `$where` expression, if any.
    pub filter: Option<String>,
}

impl TallyQuery {
    /// Incident count per `primary_type`, largest first.
    #[must_use]
    pub fn top_primary_types(limit: u32, range: Option<DateRange>) -> Self {
        Self {
            select: "primary_type,COUNT(*) AS cnt".to_string(),
            group: "primary_type".to_string(),
            order: "cnt DESC".to_string(),
            limit,
            filter: range.map(|r| r.to_where_clause(DATE_COLUMN)),
        }
    }
}

/// Builds the full request URL for `query` against `config`'s dataset.
#[must_use]
pub fn build_url(config: &ReportConfig, query: &TallyQuery) -> String {
    let mut url = format!(
        "{base}/{dataset}.json?$select={select}&$group={group}&$order={order}&$limit={limit}",
        base = config.base_url.trim_end_matches('/'),
        dataset = config.dataset_id,
        select = encode(&query.select),
        group = encode(&query.group),
        order = encode(&query.order),
        limit = query.limit,
    );

    if let Some(filter) = &query.filter {
        write!(url, "&$where={}", encode(filter)).unwrap();
    }

    url
}

/// Form-urlencodes a single query value.
fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
