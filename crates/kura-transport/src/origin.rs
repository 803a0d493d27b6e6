//! API origin resolution.
//!
//! The same client build is used from a desktop browser on the dev machine
//! and from phones on the LAN, so the origin is derived from where the UI
//! itself was served unless an explicit override is configured:
//!
//! 1. explicit override (`KURA_API_URL`), trailing `/` trimmed
//! 2. loopback page host → `http://localhost:<port>`
//! 3. anything else → `http://<page host>:<port>`

use std::fmt;
use std::net::IpAddr;

use reqwest::Url;

use crate::TransportError;

/// Port the backend listens on when no override is given.
pub const DEFAULT_API_PORT: u16 = 5000;

/// Scheme + host + port of the backend, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOrigin(String);

impl ApiOrigin {
    /// Resolves the origin from an optional override and the page host.
    ///
    /// # Errors
    /// [`TransportError::InvalidOrigin`] if the override is not an absolute
    /// `http`/`https` URL, or the page host is empty.
    pub fn resolve(
        override_url: Option<&str>,
        page_host: &str,
        port: u16,
    ) -> Result<Self, TransportError> {
        if let Some(raw) = override_url.map(str::trim).filter(|s| !s.is_empty()) {
            return Self::parse(raw);
        }

        let host = page_host.trim();
        if host.is_empty() {
            return Err(TransportError::InvalidOrigin("empty page host".into()));
        }

        if is_loopback(host) {
            return Ok(Self(format!("http://localhost:{port}")));
        }

        let host = host.trim_start_matches('[').trim_end_matches(']');
        let origin = match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("http://[{v6}]:{port}"),
            _ => format!("http://{host}:{port}"),
        };
        Self::parse(&origin)
    }

    /// Validates an explicit origin.
    ///
    /// # Errors
    /// [`TransportError::InvalidOrigin`] unless `raw` is an absolute
    /// `http`/`https` URL with a host.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let url = Url::parse(trimmed)
            .map_err(|e| TransportError::InvalidOrigin(format!("{trimmed}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(TransportError::InvalidOrigin(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends an absolute API path (`/api/...`) to the origin.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.0)
        } else {
            format!("{}/{path}", self.0)
        }
    }
}

impl fmt::Display for ApiOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_loopback(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_override_wins_and_is_trimmed() {
        let origin =
            ApiOrigin::resolve(Some("https://api.example.org/"), "10.0.0.5", 5000).unwrap();
        assert_eq!(origin.as_str(), "https://api.example.org");
    }

    #[test]
    fn test_resolve_blank_override_is_ignored() {
        let origin = ApiOrigin::resolve(Some("  "), "localhost", 5000).unwrap();
        assert_eq!(origin.as_str(), "http://localhost:5000");
    }

    #[test]
    fn test_resolve_loopback_hosts_map_to_localhost() {
        for host in ["localhost", "LOCALHOST", "127.0.0.1", "127.1.2.3", "::1", "[::1]"] {
            let origin = ApiOrigin::resolve(None, host, 5000).unwrap();
            assert_eq!(origin.as_str(), "http://localhost:5000", "host {host}");
        }
    }

    #[test]
    fn test_resolve_lan_host_keeps_host_with_fixed_port() {
        let origin = ApiOrigin::resolve(None, "192.168.1.20", 5000).unwrap();
        assert_eq!(origin.as_str(), "http://192.168.1.20:5000");

        let origin = ApiOrigin::resolve(None, "kura.local", 8080).unwrap();
        assert_eq!(origin.as_str(), "http://kura.local:8080");
    }

    #[test]
    fn test_resolve_ipv6_lan_host_is_bracketed() {
        let origin = ApiOrigin::resolve(None, "fe80::1", 5000).unwrap();
        assert_eq!(origin.as_str(), "http://[fe80::1]:5000");
    }

    #[test]
    fn test_resolve_rejects_non_http_override() {
        let result = ApiOrigin::resolve(Some("ftp://files.example.org"), "localhost", 5000);
        assert!(matches!(result, Err(TransportError::InvalidOrigin(_))));

        let result = ApiOrigin::resolve(Some("not a url"), "localhost", 5000);
        assert!(matches!(result, Err(TransportError::InvalidOrigin(_))));
    }

    #[test]
    fn test_resolve_rejects_empty_page_host() {
        let result = ApiOrigin::resolve(None, "", 5000);
        assert!(matches!(result, Err(TransportError::InvalidOrigin(_))));
    }

    #[test]
    fn test_join_handles_leading_slash() {
        let origin = ApiOrigin::parse("http://localhost:5000").unwrap();
        assert_eq!(origin.join("/api/user/profile"), "http://localhost:5000/api/user/profile");
        assert_eq!(origin.join("health"), "http://localhost:5000/health");
    }
}
