//! Durable token storage.
//!
//! The persisted token is the source of truth for "is someone signed in".
//! Every store honours an explicit expiry: a token past its deadline is
//! reported as absent (and removed, where removal is possible).

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::OnceCell;

use crate::StorageError;

/// Where the session token lives between runs.
///
/// `Send + Sync + 'static` for the same reason as the credential provider:
/// the store is shared between the session and the HTTP client.
pub trait TokenStore: Send + Sync + 'static {
    /// The stored token, or `None` if there is none or it has expired.
    fn load(&self) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Persists `token`, valid for `ttl` from now. Replaces any previous one.
    fn save(&self, token: &str, ttl: Duration)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Removes the token. Clearing an empty store is not an error.
    fn clear(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: TokenStore> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        token: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).save(token, ttl)
    }

    fn clear(&self) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).clear()
    }
}

/// A token together with its deadline, in seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: u64,
}

impl StoredToken {
    pub fn new(token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: now_secs().saturating_add(ttl.as_secs()),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= now_secs()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

/// Keeps the token in process memory only. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`.
    pub fn with_token(token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(Some(StoredToken::new(token, ttl))),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<StoredToken>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(StoredToken::is_expired) {
            slot.take();
        }
        Ok(slot.as_ref().map(|stored| stored.token.clone()))
    }

    async fn save(&self, token: &str, ttl: Duration) -> Result<(), StorageError> {
        *self.slot() = Some(StoredToken::new(token, ttl));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.slot().take();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileTokenStore
// ---------------------------------------------------------------------------

/// Persists the token as a small JSON document on disk.
///
/// ```json
/// {"token":"eyJ...","expires_at":1767225600}
/// ```
///
/// An expired file is deleted the first time it is read.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn remove(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredToken = serde_json::from_slice(&bytes)?;
        if stored.is_expired() {
            tracing::debug!(path = %self.path.display(), "stored token expired, removing");
            self.remove().await?;
            return Ok(None);
        }
        Ok(Some(stored.token))
    }

    async fn save(&self, token: &str, ttl: Duration) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(&StoredToken::new(token, ttl))?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.remove().await
    }
}

// ---------------------------------------------------------------------------
// CookieTokenStore
// ---------------------------------------------------------------------------

/// Cookie name the portal uses for its session token.
pub const TOKEN_COOKIE: &str = "token";

/// On-disk form of a persisted jar: `Set-Cookie` style strings, plus the
/// token values that were cleared so a re-seeded jar can't bring them back.
#[derive(Debug, Default, Serialize, Deserialize)]
struct JarFile {
    cookies: Vec<String>,
    #[serde(default)]
    revoked: Vec<String>,
}

#[derive(Debug, Default)]
struct Jar {
    cookies: CookieJar,
    revoked: Vec<String>,
}

impl Jar {
    fn is_live(cookie: &Cookie<'_>) -> bool {
        cookie
            .expires_datetime()
            .is_none_or(|at| at > OffsetDateTime::now_utc())
    }

    /// Adds the cookies of a raw `Cookie:` header that the jar doesn't hold
    /// yet. A revoked token is skipped.
    fn seed(&mut self, raw: &str) {
        for cookie in Cookie::split_parse(raw) {
            let cookie = match cookie {
                Ok(cookie) => cookie.into_owned(),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed cookie");
                    continue;
                }
            };
            if cookie.name() == TOKEN_COOKIE
                && self.revoked.iter().any(|v| v == cookie.value())
            {
                continue;
            }
            if self.cookies.get(cookie.name()).is_none() {
                self.cookies.add_original(cookie);
            }
        }
    }

    fn to_file(&self) -> JarFile {
        JarFile {
            cookies: self.cookies.iter().map(ToString::to_string).collect(),
            revoked: self.revoked.clone(),
        }
    }
}

/// A cookie jar that exposes the `token` cookie.
///
/// Seeded from a raw `Cookie:` header (`a=1; token=abc; b=2`). Writes give
/// the token cookie an expiry, and [`CookieTokenStore::header`] renders the
/// live cookies back into header form.
///
/// With [`CookieTokenStore::persistent`] the jar lives in a JSON file and
/// the header only seeds cookies the file doesn't know, so a cleared token
/// stays cleared across runs even if the same header is passed again.
#[derive(Debug, Default)]
pub struct CookieTokenStore {
    seed: String,
    path: Option<PathBuf>,
    jar: OnceCell<tokio::sync::Mutex<Jar>>,
}

impl CookieTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An in-memory jar seeded from a `Cookie:` header. Malformed pairs are
    /// skipped.
    pub fn from_header(raw: impl Into<String>) -> Self {
        Self {
            seed: raw.into(),
            ..Self::default()
        }
    }

    /// A jar kept in `path`, seeded from `raw` on top of what the file holds.
    pub fn persistent(path: impl Into<PathBuf>, raw: impl Into<String>) -> Self {
        Self {
            seed: raw.into(),
            path: Some(path.into()),
            jar: OnceCell::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The live cookies as a `Cookie:` header value.
    ///
    /// # Errors
    /// [`StorageError`] if a persisted jar can't be read.
    pub async fn header(&self) -> Result<String, StorageError> {
        let jar = self.jar().await?.lock().await;
        Ok(jar
            .cookies
            .iter()
            .filter(|c| Jar::is_live(c))
            .map(|c| c.stripped().to_string())
            .collect::<Vec<_>>()
            .join("; "))
    }

    async fn jar(&self) -> Result<&tokio::sync::Mutex<Jar>, StorageError> {
        self.jar
            .get_or_try_init(|| async {
                let mut jar = self.read_file().await?;
                jar.seed(&self.seed);
                Ok::<_, StorageError>(tokio::sync::Mutex::new(jar))
            })
            .await
    }

    async fn read_file(&self) -> Result<Jar, StorageError> {
        let Some(path) = &self.path else {
            return Ok(Jar::default());
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Jar::default()),
            Err(e) => return Err(e.into()),
        };
        let file: JarFile = serde_json::from_slice(&bytes)?;
        let mut jar = Jar {
            revoked: file.revoked,
            ..Jar::default()
        };
        for raw in &file.cookies {
            match Cookie::parse(raw.as_str()) {
                Ok(cookie) => jar.cookies.add_original(cookie.into_owned()),
                Err(e) => tracing::warn!(error = %e, "dropping unreadable stored cookie"),
            }
        }
        Ok(jar)
    }

    /// Writes the jar back. Called with the jar locked so writes land in
    /// order.
    async fn persist(&self, jar: &Jar) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(&jar.to_file())?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

impl TokenStore for CookieTokenStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let mut jar = self.jar().await?.lock().await;
        let Some(token) = jar.cookies.get(TOKEN_COOKIE).cloned() else {
            return Ok(None);
        };
        if !Jar::is_live(&token) {
            jar.cookies.remove(Cookie::from(TOKEN_COOKIE));
            self.persist(&jar).await?;
            return Ok(None);
        }
        Ok(Some(token.value().to_string()).filter(|v| !v.is_empty()))
    }

    async fn save(&self, token: &str, ttl: Duration) -> Result<(), StorageError> {
        let mut jar = self.jar().await?.lock().await;
        let mut cookie = Cookie::build((TOKEN_COOKIE, token.to_string()));
        if let Some(deadline) = time::Duration::try_from(ttl)
            .ok()
            .and_then(|ttl| OffsetDateTime::now_utc().checked_add(ttl))
        {
            cookie = cookie.expires(deadline);
        }
        jar.cookies.add(cookie);
        jar.revoked.retain(|v| v != token);
        self.persist(&jar).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut jar = self.jar().await?.lock().await;
        if let Some(value) = jar
            .cookies
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
        {
            if !jar.revoked.contains(&value) {
                jar.revoked.push(value);
            }
        }
        jar.cookies.remove(Cookie::from(TOKEN_COOKIE));
        self.persist(&jar).await
    }
}

// ---------------------------------------------------------------------------
// FallbackTokenStore
// ---------------------------------------------------------------------------

/// Reads from `primary`, then from `fallback` if the primary is empty or
/// unreadable. Writes go to the primary only; clearing empties both so a
/// stale fallback can't resurrect a session that was ended.
#[derive(Debug)]
pub struct FallbackTokenStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackTokenStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<P: TokenStore, F: TokenStore> TokenStore for FallbackTokenStore<P, F> {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        match self.primary.load().await {
            Ok(Some(token)) => return Ok(Some(token)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "primary token store unreadable, trying fallback"),
        }
        self.fallback.load().await
    }

    async fn save(&self, token: &str, ttl: Duration) -> Result<(), StorageError> {
        self.primary.save(token, ttl).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let primary = self.primary.clear().await;
        let fallback = self.fallback.clear().await;
        primary.and(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    #[tokio::test]
    async fn test_memory_store_save_load_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save("abc", DAY).await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("abc"));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expired_token_is_absent() {
        let store = MemoryTokenStore::with_token("old", Duration::ZERO);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        FileTokenStore::new(&path).save("abc", DAY).await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.load().await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_file_store_expired_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store.save("abc", Duration::ZERO).await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = FileTokenStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_cookie_store_reads_token_cookie() {
        let store = CookieTokenStore::from_header("lang=tr; token=xyz ; theme=dark");
        assert_eq!(store.load().await.unwrap().as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_cookie_store_ignores_empty_and_malformed() {
        let store = CookieTokenStore::from_header("garbage; token=; =x");
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cookie_store_clear_keeps_other_cookies() {
        let store = CookieTokenStore::from_header("lang=tr; token=xyz");
        store.clear().await.unwrap();
        assert_eq!(store.header().await.unwrap(), "lang=tr");
    }

    #[tokio::test]
    async fn test_cookie_store_save_replaces_token() {
        let store = CookieTokenStore::from_header("token=old");
        store.save("new", DAY).await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.header().await.unwrap(), "token=new");

        store.save("gone", Duration::ZERO).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cookie_store_expired_stored_cookie_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(
            &path,
            r#"{"cookies":["token=old; Expires=Wed, 21 Oct 2015 07:28:00 GMT","lang=tr"]}"#,
        )
        .unwrap();

        let store = CookieTokenStore::persistent(&path, "");
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(store.header().await.unwrap(), "lang=tr");
    }

    #[tokio::test]
    async fn test_cookie_store_persistent_clear_survives_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let first = CookieTokenStore::persistent(&path, "lang=tr; token=xyz");
        assert_eq!(first.load().await.unwrap().as_deref(), Some("xyz"));
        first.clear().await.unwrap();

        let restarted = CookieTokenStore::persistent(&path, "lang=tr; token=xyz");
        assert_eq!(restarted.load().await.unwrap(), None);
        assert_eq!(restarted.header().await.unwrap(), "lang=tr");

        let new_header = CookieTokenStore::persistent(&path, "token=issued-later");
        assert_eq!(new_header.load().await.unwrap().as_deref(), Some("issued-later"));
    }

    #[tokio::test]
    async fn test_cookie_store_persistent_save_reloads_with_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let store = CookieTokenStore::persistent(&path, "");
        store.save("abc", DAY).await.unwrap();
        store.save("stale", Duration::ZERO).await.unwrap();

        let reopened = CookieTokenStore::persistent(&path, "token=abc");
        assert_eq!(reopened.load().await.unwrap(), None);

        store.save("abc", DAY).await.unwrap();
        let reopened = CookieTokenStore::persistent(&path, "");
        assert_eq!(reopened.load().await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_cookie_store_corrupt_jar_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, b"[").unwrap();

        let err = CookieTokenStore::persistent(&path, "token=x").load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_fallback_store_prefers_primary() {
        let store = FallbackTokenStore::new(
            MemoryTokenStore::with_token("primary", DAY),
            CookieTokenStore::from_header("token=cookie"),
        );
        assert_eq!(store.load().await.unwrap().as_deref(), Some("primary"));
    }

    #[tokio::test]
    async fn test_fallback_store_reads_fallback_when_primary_empty() {
        let store = FallbackTokenStore::new(
            MemoryTokenStore::new(),
            CookieTokenStore::from_header("token=cookie"),
        );
        assert_eq!(store.load().await.unwrap().as_deref(), Some("cookie"));
    }

    #[tokio::test]
    async fn test_fallback_store_reads_fallback_when_primary_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"{").unwrap();

        let store = FallbackTokenStore::new(
            FileTokenStore::new(&path),
            CookieTokenStore::from_header("token=cookie"),
        );
        assert_eq!(store.load().await.unwrap().as_deref(), Some("cookie"));
    }

    #[tokio::test]
    async fn test_fallback_store_save_writes_primary_clear_empties_both() {
        let store = FallbackTokenStore::new(
            MemoryTokenStore::new(),
            CookieTokenStore::from_header("token=cookie"),
        );
        store.save("fresh", DAY).await.unwrap();
        assert_eq!(store.primary().load().await.unwrap().as_deref(), Some("fresh"));
        assert_eq!(store.fallback().load().await.unwrap().as_deref(), Some("cookie"));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
