#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate crime statistics fetcher.
//!
//! Queries a Socrata SODA resource endpoint for incident counts grouped by
//! crime type and renders the top N as a ranked report. The flow is a
//! straight pipeline of small steps, one module each:
//!
//! 1. [`query`] builds the request URL.
//! 2. [`transport`] performs the single GET and times it.
//! 3. [`decode`] reverses `Content-Encoding: gzip` and decodes UTF-8.
//! 4. [`extract`] pulls `(category, count)` rows out of the body.
//! 5. [`format`] renders the [`format::Report`].

pub mod config;
pub mod decode;
pub mod extract;
pub mod format;
pub mod query;
pub mod transport;

use crate::config::ReportConfig;
use crate::format::Report;
use crate::query::TallyQuery;
use crate::transport::SodaClient;

/// Maximum length of the response body included in status errors.
const ERROR_BODY_PREVIEW_LEN: usize = 500;

/// Errors that can occur while fetching or building a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Network-level failure (DNS, connection refused, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Unexpected response code: {status}\nBody: {}", format::snippet(.body, ERROR_BODY_PREVIEW_LEN))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Decoded response body.
        body: String,
    },

    /// The gzip stream could not be inflated.
    #[error("Failed to decompress response body: {0}")]
    Decompress(#[from] std::io::Error),

    /// The (decompressed) body is not valid UTF-8.
    #[error("Response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration (bad header value, unreadable config file, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Fetches the tally described by `query` and wraps it in a [`Report`].
///
/// Performs exactly one HTTP request. A successful response that yields no
/// rows is not an error: the returned report carries the raw body so the
/// formatter can show a diagnostic snippet.
///
/// # Errors
///
/// Returns [`ReportError`] if the request fails, the server returns a
/// non-2xx status, or the body cannot be decompressed or decoded.
pub async fn fetch_top_crimes(
    client: &SodaClient,
    config: &ReportConfig,
    query: &TallyQuery,
) -> Result<Report, ReportError> {
    let url = query::build_url(config, query);
    log::info!("Fetching top {} crime types for {}", query.limit, config.city);
    log::debug!("Request URL: {url}");

    let response = client.get(&url).await?;
    let body = response.decode_checked()?;

    let mut tally = extract::extract_rows(&body);
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
    let dropped = tally.truncate_to(limit);
    if dropped > 0 {
        log::warn!(
            "Server returned {dropped} rows beyond the requested limit of {}",
            query.limit
        );
    }

    log::info!(
        "Parsed {} rows ({} incidents) in {} ms",
        tally.len(),
        tally.total(),
        response.elapsed.as_millis()
    );

    Ok(Report::new(
        config.city.clone(),
        tally,
        body,
        response.elapsed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::gzip;
    use crate::transport::tests::{http_response, serve_once};

    fn config_for(base_url: String) -> ReportConfig {
        ReportConfig {
            base_url,
            ..ReportConfig::default()
        }
    }

    #[tokio::test]
    async fn fetches_and_truncates_to_limit() {
        let body = br#"[{"primary_type":"THEFT","cnt":"500"},{"primary_type":"BATTERY","cnt":"300"},{"primary_type":"ASSAULT","cnt":"100"}]"#;
        let (url, server) = serve_once(http_response(
            "200 OK",
            &[("Content-Encoding", "gzip")],
            &gzip(body),
        ))
        .await;
        let config = config_for(url);
        let client = SodaClient::new(&config).unwrap();
        let query = TallyQuery::top_primary_types(2, None);

        let report = fetch_top_crimes(&client, &config, &query).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("get /ijzp-q8t2.json?$select="));
        assert!(request.contains("$limit=2 http/1.1"));
        assert_eq!(report.tally.len(), 2);
        let text = report.render_text();
        assert!(text.starts_with("Top 2 crime types in Chicago:\n 1. THEFT"));
        assert!(text.contains(" 2. BATTERY"));
        assert!(!text.contains("ASSAULT"));
    }

    #[tokio::test]
    async fn zero_rows_is_not_an_error() {
        let (url, server) = serve_once(http_response("200 OK", &[], b"[]")).await;
        let config = config_for(url);
        let client = SodaClient::new(&config).unwrap();
        let query = TallyQuery::top_primary_types(10, None);

        let report = fetch_top_crimes(&client, &config, &query).await.unwrap();
        server.await.unwrap();

        let text = report.render_text();
        assert!(text.starts_with("Top 0 crime types in Chicago:\n"));
        assert!(text.contains("Parsing produced 0 items"));
        assert!(text.contains("\n[]\n"));
    }

    #[tokio::test]
    async fn rate_limited_response_is_fatal() {
        let (url, server) = serve_once(http_response(
            "429 Too Many Requests",
            &[],
            b"{\"message\":\"slow down\"}",
        ))
        .await;
        let config = config_for(url);
        let client = SodaClient::new(&config).unwrap();
        let query = TallyQuery::top_primary_types(10, None);

        let err = fetch_top_crimes(&client, &config, &query)
            .await
            .unwrap_err();
        server.await.unwrap();

        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("slow down"));
    }

    #[test]
    fn status_error_includes_code_and_body() {
        let err = ReportError::Status {
            status: 429,
            body: r#"{"message":"Too many requests"}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("Too many requests"));
    }

    #[test]
    fn status_error_truncates_long_bodies() {
        let err = ReportError::Status {
            status: 500,
            body: "x".repeat(2_000),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 600);
    }
}
