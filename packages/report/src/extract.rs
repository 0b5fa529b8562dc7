//! Row extraction from SODA aggregate responses.
//!
//! A SODA aggregate response is a JSON array of flat objects, e.g.
//! `[{"primary_type":"THEFT","cnt":"500"}, ...]`. Socrata serializes
//! aggregates as strings, but bare numbers are accepted too.
//!
//! [`extract_rows`] decodes the array structurally. If the body is not a
//! JSON array at all, it falls back to [`scan_rows`], a permissive textual
//! scan that pairs each category with the next count in the text.

use crime_report_models::{CrimeTally, TallyRow};
use regex::Regex;
use serde_json::Value;

/// Field holding the crime category.
pub const CATEGORY_FIELD: &str = "primary_type";

/// Field holding the aggregated count (the `COUNT(*) AS cnt` alias).
pub const COUNT_FIELD: &str = "cnt";

/// Extracts ranked rows from a decoded response body.
///
/// Records with a missing or malformed category or count are skipped.
/// Never fails: an unrecognizable body yields an empty tally.
#[must_use]
pub fn extract_rows(text: &str) -> CrimeTally {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(records)) => records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let row = parse_record(record);
                if row.is_none() {
                    log::debug!("Skipping malformed record {index}: {record}");
                }
                row
            })
            .collect(),
        Ok(other) => {
            log::debug!(
                "Response is a JSON {} rather than an array, scanning text",
                json_kind(&other)
            );
            scan_rows(text)
        }
        Err(e) => {
            log::debug!("Response is not valid JSON ({e}), scanning text");
            scan_rows(text)
        }
    }
}

fn parse_record(record: &Value) -> Option<TallyRow> {
    let object = record.as_object()?;
    let field = |name: &str| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    };

    let category = field(CATEGORY_FIELD)?.as_str()?;
    if category.is_empty() {
        return None;
    }
    let count = parse_count(field(COUNT_FIELD)?)?;

    Some(TallyRow::new(category, count))
}

/// Accepts a non-negative integer or a string of ASCII digits.
fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_digits(s.trim()),
        _ => None,
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Scans raw text for `"primary_type": "..."` followed, anywhere later
/// (across lines, case-insensitively), by `"cnt": N` or `"cnt": "N"`.
///
/// Order-dependent: each category pairs with the first count after it.
/// Counts that overflow `u64` are skipped.
#[must_use]
pub fn scan_rows(text: &str) -> CrimeTally {
    let re = Regex::new(&format!(
        r#"(?is)"{CATEGORY_FIELD}"\s*:\s*"([^"]+)".*?"{COUNT_FIELD}"\s*:\s*"?(\d+)"?"#
    ))
    .unwrap_or_else(|_| unreachable!());

    re.captures_iter(text)
        .filter_map(|caps| {
            let category = caps.get(1)?.as_str();
            let count = parse_digits(caps.get(2)?.as_str())?;
            Some(TallyRow::new(category, count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(tally: &CrimeTally) -> Vec<(&str, u64)> {
        tally
            .rows()
            .iter()
            .map(|r| (r.category.as_str(), r.count))
            .collect()
    }

    #[test]
    fn extracts_well_formed_pairs_in_order() {
        let body = r#"[{"primary_type":"THEFT","cnt":"500"},{"primary_type":"BATTERY","cnt":"300"}]"#;
        let tally = extract_rows(body);
        assert_eq!(pairs(&tally), vec![("THEFT", 500), ("BATTERY", 300)]);
    }

    #[test]
    fn empty_array_yields_no_rows() {
        assert!(extract_rows("[]").is_empty());
        assert!(extract_rows("").is_empty());
        assert!(extract_rows("   \n").is_empty());
    }

    #[test]
    fn accepts_bare_and_quoted_counts() {
        let body = r#"[{"primary_type":"THEFT","cnt":500},{"primary_type":"ASSAULT","cnt":" 42 "}]"#;
        assert_eq!(
            pairs(&extract_rows(body)),
            vec![("THEFT", 500), ("ASSAULT", 42)]
        );
    }

    #[test]
    fn matches_keys_case_insensitively_in_any_order() {
        let body = r#"[{"CNT":"7","Primary_Type":"ARSON"}]"#;
        assert_eq!(pairs(&extract_rows(body)), vec![("ARSON", 7)]);
    }

    #[test]
    fn skips_malformed_records() {
        let body = r#"[
            {"primary_type":"THEFT","cnt":"500"},
            {"primary_type":"BATTERY","cnt":"abc"},
            {"primary_type":"","cnt":"10"},
            {"cnt":"20"},
            {"primary_type":"ASSAULT","cnt":-5},
            {"primary_type":"ROBBERY","cnt":1.5},
            "not an object",
            {"primary_type":"NARCOTICS","cnt":"100"}
        ]"#;
        assert_eq!(
            pairs(&extract_rows(body)),
            vec![("THEFT", 500), ("NARCOTICS", 100)]
        );
    }

    #[test]
    fn falls_back_to_scan_for_non_json_text() {
        let body = "garbage prefix \"primary_type\": \"THEFT\",\n\"cnt\": \"12\" trailing";
        assert_eq!(pairs(&extract_rows(body)), vec![("THEFT", 12)]);
    }

    #[test]
    fn error_object_yields_no_rows() {
        let body = r#"{"code":"query.soql.no-such-column","message":"No such column"}"#;
        assert!(extract_rows(body).is_empty());
    }

    #[test]
    fn scan_pairs_across_lines_case_insensitively() {
        let body = "[{\"PRIMARY_TYPE\" : \"THEFT\",\n \"other\": 1,\n \"CNT\": 500},\n{\"primary_type\":\"BATTERY\",\"cnt\":\"300\"}]";
        assert_eq!(
            pairs(&scan_rows(body)),
            vec![("THEFT", 500), ("BATTERY", 300)]
        );
    }

    #[test]
    fn scan_skips_overflowing_counts() {
        let body = r#"[{"primary_type":"THEFT","cnt":"99999999999999999999999"},{"primary_type":"BATTERY","cnt":"3"}]"#;
        assert_eq!(pairs(&scan_rows(body)), vec![("BATTERY", 3)]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let body = r#"[{"primary_type":"THEFT","cnt":"500"},{"primary_type":"BATTERY","cnt":"300"}]"#;
        assert_eq!(extract_rows(body), extract_rows(body));
        assert_eq!(scan_rows(body), scan_rows(body));
    }
}
