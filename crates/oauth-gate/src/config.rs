//! Configuration for the token service client and the demo host.
//!
//! Configuration is loaded from environment variables once at startup and is
//! immutable afterwards. Credentials embedded in the base URL are redacted in
//! Debug output.

use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default token service base URL.
pub const DEFAULT_OAUTH_BASE_URL: &str = "http://localhost:8080";

/// Default upper bound on a single token lookup.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(100);

/// Default connection timeout for the token service client.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);

/// Largest accepted value for `OAUTH_TIMEOUT_MS`.
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default bind address for the demo host.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid token service base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid token service timeout: {0}")]
    InvalidTimeout(String),
}

/// Connection settings for the remote token service.
#[derive(Clone, PartialEq, Eq)]
pub struct OauthClientConfig {
    /// Base URL of the token service (scheme, host and optional path prefix).
    pub base_url: Url,

    /// Upper bound on the whole lookup, connect through body.
    pub request_timeout: Duration,

    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
}

impl fmt::Debug for OauthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = self.base_url.clone();
        if !shown.username().is_empty() || shown.password().is_some() {
            // Only fails for cannot-be-a-base URLs, which `new` rejects.
            let _ = shown.set_username("[REDACTED]");
            let _ = shown.set_password(None);
        }

        f.debug_struct("OauthClientConfig")
            .field("base_url", &shown.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl OauthClientConfig {
    /// Create a configuration with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the URL does not parse or is
    /// not an `http`/`https` base URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        // Errors never echo the raw value; it may carry credentials.
        let url = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "scheme must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(
                "URL cannot be used as a base URL".to_string(),
            ));
        }

        Ok(Self {
            base_url: url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Demo host configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Token service client settings.
    pub oauth: OauthClientConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let base_url = vars
            .get("OAUTH_BASE_URL")
            .map(String::as_str)
            .unwrap_or(DEFAULT_OAUTH_BASE_URL);

        let request_timeout = if let Some(value_str) = vars.get("OAUTH_TIMEOUT_MS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTimeout(format!(
                    "OAUTH_TIMEOUT_MS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidTimeout(
                    "OAUTH_TIMEOUT_MS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_REQUEST_TIMEOUT_MS {
                return Err(ConfigError::InvalidTimeout(format!(
                    "OAUTH_TIMEOUT_MS must not exceed {} milliseconds, got {}",
                    MAX_REQUEST_TIMEOUT_MS, value
                )));
            }

            Duration::from_millis(value)
        } else {
            DEFAULT_REQUEST_TIMEOUT
        };

        let oauth = OauthClientConfig::new(base_url)?.with_request_timeout(request_timeout);

        Ok(Config {
            bind_address,
            oauth,
        })
    }
}
