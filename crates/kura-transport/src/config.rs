//! HTTP client configuration parsed from environment variables.

use std::time::Duration;

use crate::origin::{ApiOrigin, DEFAULT_API_PORT};
use crate::TransportError;

pub const ENV_API_URL: &str = "KURA_API_URL";
pub const ENV_PAGE_HOST: &str = "KURA_PAGE_HOST";
pub const ENV_API_PORT: &str = "KURA_API_PORT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "KURA_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "KURA_CONNECT_TIMEOUT_SECS";

/// Settings for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Explicit API origin; wins over everything else.
    pub api_url: Option<String>,
    /// Host the UI was served from, used to derive the origin.
    pub page_host: String,
    /// Backend port used for derived origins.
    pub api_port: u16,
    /// Whole-request timeout. `None` waits forever.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            page_host: "localhost".to_string(),
            api_port: DEFAULT_API_PORT,
            request_timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `KURA_API_URL`: origin override
    /// - `KURA_PAGE_HOST`: default `localhost`
    /// - `KURA_API_PORT`: default 5000
    /// - `KURA_REQUEST_TIMEOUT_SECS`, `KURA_CONNECT_TIMEOUT_SECS`: unset means no timeout
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`, so
    /// tests don't have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()),
            page_host: lookup(ENV_PAGE_HOST)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.page_host),
            api_port: parse_or(&lookup, ENV_API_PORT, defaults.api_port),
            request_timeout: parse_secs(&lookup, ENV_REQUEST_TIMEOUT_SECS),
            connect_timeout: parse_secs(&lookup, ENV_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Sets an explicit origin.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// # Errors
    /// See [`ApiOrigin::resolve`].
    pub fn resolve_origin(&self) -> Result<ApiOrigin, TransportError> {
        ApiOrigin::resolve(self.api_url.as_deref(), &self.page_host, self.api_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let secs: u64 = parse_or(lookup, key, 0);
    (secs > 0).then(|| Duration::from_secs(secs))
}
