//! Report configuration.
//!
//! A [`ReportConfig`] is a plain struct passed to the client at
//! construction. It starts from built-in defaults and can be overlaid with
//! a TOML file and then with environment variables. Credentials are
//! optional; when absent, the corresponding headers are simply not sent.

use std::path::Path;

use serde::Deserialize;

use crate::ReportError;

/// Default Socrata resource endpoint.
pub const DEFAULT_BASE_URL: &str = "https://data.cityofchicago.org/resource";

/// Chicago "Crimes - 2001 to Present" dataset.
pub const DEFAULT_DATASET_ID: &str = "ijzp-q8t2";

/// City name shown in the report header.
pub const DEFAULT_CITY: &str = "Chicago";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "SODA_BASE_URL";
/// Environment variable overriding the dataset identifier.
pub const ENV_DATASET_ID: &str = "SODA_DATASET_ID";
/// Environment variable holding the Socrata application token.
pub const ENV_APP_TOKEN: &str = "SODA_APP_TOKEN";
/// Environment variable holding the API key id sent alongside the token.
pub const ENV_API_KEY_ID: &str = "SODA_API_KEY_ID";
/// Environment variable overriding the `User-Agent` header.
pub const ENV_USER_AGENT: &str = "CRIME_REPORT_USER_AGENT";

/// Connection and credential settings for a report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Resource endpoint without a trailing slash.
    pub base_url: String,
    /// Dataset identifier appended to the base URL.
    pub dataset_id: String,
    /// City name for the report header.
    pub city: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Application token (`X-App-Token`), reduces rate limiting.
    pub app_token: Option<String>,
    /// Key id (`X-API-Key-Id`), only sent together with `app_token`.
    pub api_key_id: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            city: DEFAULT_CITY.to_string(),
            user_agent: default_user_agent(),
            app_token: None,
            api_key_id: None,
        }
    }
}

fn default_user_agent() -> String {
    format!("crime_report/{}", env!("CARGO_PKG_VERSION"))
}

/// On-disk shape of a config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    dataset_id: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    app_token: Option<String>,
    #[serde(default)]
    api_key_id: Option<String>,
}

impl ReportConfig {
    /// Builds a config from the defaults overlaid with environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Parses a TOML config, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the TOML is malformed or contains
    /// unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ReportError> {
        let file: ConfigFile = toml::from_str(s).map_err(|e| ReportError::Config {
            message: format!("invalid config: {e}"),
        })?;
        Ok(Self::default().overlay(file))
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ReportError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Overlays environment variables on top of `self`.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlays values from `lookup` (keyed by the `ENV_*` names).
    ///
    /// Empty or whitespace-only values are ignored.
    #[must_use]
    pub fn with_lookup(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_empty(lookup(key));
        self.overlay(ConfigFile {
            base_url: get(ENV_BASE_URL),
            dataset_id: get(ENV_DATASET_ID),
            city: None,
            user_agent: get(ENV_USER_AGENT),
            app_token: get(ENV_APP_TOKEN),
            api_key_id: get(ENV_API_KEY_ID),
        })
    }

    fn overlay(mut self, file: ConfigFile) -> Self {
        if let Some(base_url) = non_empty(file.base_url) {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(dataset_id) = non_empty(file.dataset_id) {
            self.dataset_id = dataset_id;
        }
        if let Some(city) = non_empty(file.city) {
            self.city = city;
        }
        if let Some(user_agent) = non_empty(file.user_agent) {
            self.user_agent = user_agent;
        }
        if let Some(token) = non_empty(file.app_token) {
            self.app_token = Some(token);
        }
        if let Some(key_id) = non_empty(file.api_key_id) {
            self.api_key_id = Some(key_id);
        }
        self
    }

    /// Returns the token and key-id headers that should be sent.
    ///
    /// The key id is bookkeeping for the token and is never sent alone.
    #[must_use]
    pub fn credential_headers(&self) -> Vec<(&'static str, &str)> {
        let Some(token) = self.app_token.as_deref() else {
            return Vec::new();
        };
        let mut headers = vec![("X-App-Token", token)];
        if let Some(key_id) = self.api_key_id.as_deref() {
            headers.push(("X-API-Key-Id", key_id));
        }
        headers
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
