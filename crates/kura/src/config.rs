//! Whole-client configuration: HTTP settings plus where the token lives.

use std::path::PathBuf;

use kura_session::{CookieTokenStore, FallbackTokenStore, FileTokenStore, SessionConfig};
use kura_transport::ClientConfig;

pub const ENV_TOKEN_FILE: &str = "KURA_TOKEN_FILE";
pub const ENV_COOKIE: &str = "KURA_COOKIE";

/// Token file used when `KURA_TOKEN_FILE` is unset.
pub const DEFAULT_TOKEN_FILE: &str = ".kura-token.json";

/// The token store [`PortalConfig::token_store`] builds: the token file,
/// falling back to the `token` cookie of a jar kept next to it.
pub type PortalTokenStore = FallbackTokenStore<FileTokenStore, CookieTokenStore>;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub client: ClientConfig,
    pub session: SessionConfig,
    pub token_file: PathBuf,
    /// Raw `Cookie:` header to read a fallback token from.
    pub cookie: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            session: SessionConfig::default(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            cookie: None,
        }
    }
}

impl PortalConfig {
    /// Reads the `KURA_*` variables. See [`ClientConfig::from_env`] for
    /// the HTTP ones; on top of those:
    /// - `KURA_TOKEN_FILE`: default `.kura-token.json`
    /// - `KURA_COOKIE`: optional
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            client: ClientConfig::from_lookup(&lookup),
            session: SessionConfig::default(),
            token_file: non_empty(ENV_TOKEN_FILE)
                .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from),
            cookie: non_empty(ENV_COOKIE),
        }
    }

    /// Where the cookie jar is persisted: `<token file>.cookies.json`.
    pub fn cookie_file(&self) -> PathBuf {
        self.token_file.with_extension("cookies.json")
    }

    /// The token file backed by the persisted cookie jar. `cookie` only
    /// seeds the jar, so a token cleared by a logout isn't picked up again
    /// on the next run.
    pub fn token_store(&self) -> PortalTokenStore {
        let seed = self.cookie.clone().unwrap_or_default();
        let cookies = CookieTokenStore::persistent(self.cookie_file(), seed);
        FallbackTokenStore::new(FileTokenStore::new(&self.token_file), cookies)
    }
}
