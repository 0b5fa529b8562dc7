//! Single-shot HTTP transport for SODA requests.
//!
//! Each [`SodaClient::get`] call sends exactly one request: no retries, no
//! timeout beyond the `reqwest` defaults. The elapsed time covers sending
//! the request through receiving the full body.

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_ENCODING, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::ReportError;
use crate::config::ReportConfig;
use crate::decode::decode_body;

/// HTTP client preconfigured with the SODA request headers.
#[derive(Debug, Clone)]
pub struct SodaClient {
    client: reqwest::Client,
}

/// Undecoded response plus the measured transfer time.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Encoding` header, if present.
    pub content_encoding: Option<String>,
    /// Body bytes exactly as received.
    pub body: Vec<u8>,
    /// Time from sending the request to receiving the last body byte.
    pub elapsed: Duration,
}

impl SodaClient {
    /// Builds a client sending `Accept`, `Accept-Encoding`, `User-Agent`,
    /// and the credential headers from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if a configured value is not a valid
    /// header value, or [`ReportError::Http`] if the client cannot be built.
    pub fn new(config: &ReportConfig) -> Result<Self, ReportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);

        for (name, value) in config.credential_headers() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ReportError::Config {
                message: format!("invalid header name '{name}': {e}"),
            })?;
            let value = header_value(name.as_str(), value)?;
            headers.insert(name, value);
        }

        if config.app_token.is_none() {
            log::debug!("No application token configured, requests may be rate limited");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Sends one GET request and reads the full body.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Http`] on network-level failures. Non-2xx
    /// statuses are not errors here; see [`RawResponse::decode_checked`].
    pub async fn get(&self, url: &str) -> Result<RawResponse, ReportError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let content_encoding = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.bytes().await?.to_vec();
        let elapsed = start.elapsed();

        log::debug!(
            "HTTP {status}: {} bytes (content-encoding: {content_encoding:?}) in {elapsed:?}",
            body.len()
        );

        Ok(RawResponse {
            status,
            content_encoding,
            body,
            elapsed,
        })
    }
}

impl RawResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body and fails on non-2xx statuses.
    ///
    /// The body is decoded before the status check so a status error can
    /// carry the readable body. If an error body itself cannot be decoded,
    /// a lossy rendering of the raw bytes is used instead.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Status`] for non-2xx responses, or a decode
    /// error for 2xx responses whose body cannot be decoded.
    pub fn decode_checked(&self) -> Result<String, ReportError> {
        let decoded = decode_body(&self.body, self.content_encoding.as_deref());

        if self.is_success() {
            return decoded;
        }

        let body = decoded.unwrap_or_else(|e| {
            log::warn!("Could not decode error response body: {e}");
            String::from_utf8_lossy(&self.body).into_owned()
        });
        log::error!("Request failed with HTTP {}", self.status);

        Err(ReportError::Status {
            status: self.status,
            body,
        })
    }
}

/// Credential values are kept out of the error message.
fn header_value(name: &str, value: &str) -> Result<HeaderValue, ReportError> {
    HeaderValue::from_str(value).map_err(|e| ReportError::Config {
        message: format!("invalid value for header '{name}': {e}"),
    })
}
