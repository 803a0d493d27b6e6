//! The session store: one authoritative `{token, user, loading}` record.
//!
//! All mutations happen here. Other code reads [`SessionSnapshot`]s and
//! listens for [`Notice`]s.
//!
//! # Consistency
//!
//! - A profile is never stored without a token.
//! - Every change of token bumps a generation counter. Slow responses
//!   (startup hydration, profile updates) only apply if the generation is
//!   still the one they started under, so a logout that lands mid-flight
//!   can't be undone by a late answer.
//! - The durable token and the in-memory one are changed together, under
//!   the write lock.
//!
//! ```text
//! new() ──→ initialize() ──┬── no token ────────────────→ Anonymous
//!                          ├── profile ok ──────────────→ Authenticated
//!                          ├── 401/403 ── expire() ─────→ Anonymous
//!                          └── other error ─────────────→ ProfileUnavailable
//!
//! login()/register() ── ok ──→ Authenticated      logout() ──→ Anonymous
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kura_protocol::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};
use kura_transport::{CredentialProvider, TransportError};
use tokio::sync::{RwLock, broadcast};

use crate::notice::{Notifier, messages};
use crate::{
    AuthApi, AuthError, Notice, SessionConfig, SessionPhase, SessionSnapshot, TokenStore,
};

#[derive(Debug, Default)]
struct SessionData {
    token: Option<String>,
    user: Option<User>,
    loading: bool,
    generation: u64,
}

impl SessionData {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token.clone(),
            user: self.user.clone(),
            loading: self.loading,
        }
    }
}

/// State shared between the store and the credentials it hands to the
/// HTTP client.
struct Shared<S> {
    data: RwLock<SessionData>,
    tokens: S,
    notifier: Notifier,
    config: SessionConfig,
    authenticating: AtomicUsize,
    started: AtomicBool,
}

impl<S: TokenStore> Shared<S> {
    /// Drops token and profile, in memory and on disk.
    ///
    /// With `expected = Some(generation)` nothing happens unless the
    /// session is still that generation; returns `None` in that case.
    /// Otherwise returns whether a token was held.
    async fn end(&self, expected: Option<u64>) -> Option<bool> {
        let mut data = self.data.write().await;
        if expected.is_some_and(|g| g != data.generation) {
            return None;
        }
        let had_token = data.token.take().is_some();
        data.user = None;
        data.generation += 1;
        if let Err(e) = self.tokens.clear().await {
            tracing::warn!(error = %e, "failed to clear stored token");
        }
        Some(had_token)
    }

    /// Forced logout. Announced only if there was a session to end.
    async fn expire(&self, expected: Option<u64>) {
        if self.end(expected).await == Some(true) {
            tracing::warn!("session expired");
            self.notifier.emit(Notice::error(messages::SESSION_EXPIRED));
        }
    }
}

/// Marks a login or register as in flight for as long as it's alive.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

// ---------------------------------------------------------------------------
// SessionCredentials
// ---------------------------------------------------------------------------

/// The store's side of the HTTP client's credential hook.
///
/// Tokens are read from durable storage on every request, so a token
/// written by login is used by the very next call. A rejected credential
/// ends the session.
pub struct SessionCredentials<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for SessionCredentials<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: TokenStore> CredentialProvider for SessionCredentials<S> {
    async fn bearer_token(&self) -> Option<String> {
        match self.shared.tokens.load().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "stored token unreadable, sending request without it");
                None
            }
        }
    }

    async fn revoke(&self) {
        self.shared.expire(None).await;
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Owns the session lifecycle.
///
/// `A` is the backend, `S` is where the token is persisted. The API is
/// built from the store's own [`SessionCredentials`] so that requests
/// carry the current token and 401s end the session:
///
/// ```rust
/// use kura_session::{MemoryTokenStore, SessionConfig, SessionStore};
/// use kura_transport::{ApiClient, ClientConfig, NullNavigator};
///
/// # fn main() -> Result<(), kura_transport::TransportError> {
/// let store = SessionStore::try_new(
///     MemoryTokenStore::new(),
///     SessionConfig::default(),
///     |credentials| ApiClient::new(&ClientConfig::default(), credentials, NullNavigator),
/// )?;
/// # let _ = store;
/// # Ok(())
/// # }
/// ```
pub struct SessionStore<A, S> {
    shared: Arc<Shared<S>>,
    api: A,
}

impl<A: AuthApi, S: TokenStore> SessionStore<A, S> {
    /// Creates the store in the `Initializing` phase. Call
    /// [`SessionStore::initialize`] to check the stored token.
    pub fn new<F>(tokens: S, config: SessionConfig, connect: F) -> Self
    where
        F: FnOnce(SessionCredentials<S>) -> A,
    {
        let shared = Self::shared(tokens, config);
        let api = connect(SessionCredentials { shared: Arc::clone(&shared) });
        Self { shared, api }
    }

    /// Like [`SessionStore::new`] for backends whose construction can fail.
    ///
    /// # Errors
    /// Whatever `connect` returns.
    pub fn try_new<F, E>(tokens: S, config: SessionConfig, connect: F) -> Result<Self, E>
    where
        F: FnOnce(SessionCredentials<S>) -> Result<A, E>,
    {
        let shared = Self::shared(tokens, config);
        let api = connect(SessionCredentials { shared: Arc::clone(&shared) })?;
        Ok(Self { shared, api })
    }

    fn shared(tokens: S, config: SessionConfig) -> Arc<Shared<S>> {
        Arc::new(Shared {
            data: RwLock::new(SessionData {
                loading: true,
                ..SessionData::default()
            }),
            tokens,
            notifier: Notifier::new(config.notice_capacity),
            config,
            authenticating: AtomicUsize::new(0),
            started: AtomicBool::new(false),
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn credentials(&self) -> SessionCredentials<S> {
        SessionCredentials {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.shared.notifier.subscribe()
    }

    /// Puts a notice from outside the session (a refused route, say) on
    /// the same channel as the store's own.
    pub fn announce(&self, notice: Notice) {
        self.shared.notifier.emit(notice);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.data.read().await.snapshot()
    }

    pub async fn phase(&self) -> SessionPhase {
        let authenticating = self.shared.authenticating.load(Ordering::Acquire) > 0;
        self.snapshot().await.phase(authenticating)
    }

    /// Startup check: reads the stored token and, if there is one, fetches
    /// the profile it belongs to.
    ///
    /// - no token: anonymous
    /// - profile fetched: authenticated
    /// - 401/403: the token is dropped (one "session expired" notice)
    /// - any other failure: the token is kept, the profile stays empty
    ///
    /// `loading` is false afterwards in every case. Runs once; later calls
    /// just return the current snapshot.
    pub async fn initialize(&self) -> SessionSnapshot {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            return self.snapshot().await;
        }

        let stored = match self.shared.tokens.load().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "stored token unreadable, discarding");
                if let Err(e) = self.shared.tokens.clear().await {
                    tracing::warn!(error = %e, "failed to clear stored token");
                }
                None
            }
        };

        if let Some(token) = stored {
            let generation = {
                let mut data = self.shared.data.write().await;
                if data.token.is_none() {
                    data.token = Some(token);
                    data.generation += 1;
                }
                data.generation
            };
            if let Ok(user) = self.hydrate(generation).await {
                tracing::info!(user_id = %user.id, "session restored");
            }
        } else {
            tracing::info!("no stored session");
        }

        let mut data = self.shared.data.write().await;
        data.loading = false;
        data.snapshot()
    }

    /// Fetches the profile again for the current token.
    ///
    /// Returns `Ok(None)` when nobody is signed in. Failures follow the
    /// same rules as [`SessionStore::initialize`].
    ///
    /// # Errors
    /// [`AuthError`] from the profile request.
    pub async fn refresh_profile(&self) -> Result<Option<User>, AuthError> {
        let (signed_in, generation) = {
            let data = self.shared.data.read().await;
            (data.token.is_some(), data.generation)
        };
        if !signed_in {
            return Ok(None);
        }
        self.hydrate(generation).await.map(Some)
    }

    async fn hydrate(&self, generation: u64) -> Result<User, AuthError> {
        match self.api.fetch_profile().await {
            Ok(user) => {
                let mut data = self.shared.data.write().await;
                if data.generation == generation && data.token.is_some() {
                    data.user = Some(user.clone());
                } else {
                    tracing::debug!("session changed while fetching profile, discarding it");
                }
                Ok(user)
            }
            Err(e) => {
                let err = AuthError::from_transport(e, messages::PROFILE_UNAVAILABLE);
                if err.is_auth_rejection() {
                    tracing::warn!(status = ?err.status(), "stored credential rejected");
                    self.shared.expire(Some(generation)).await;
                } else {
                    tracing::warn!(error = %err, "profile fetch failed, keeping session");
                }
                Err(err)
            }
        }
    }

    /// Signs in with a national id, phone or e-mail plus password.
    ///
    /// On success the token is persisted, the session holds the returned
    /// profile and one success notice goes out. On failure the session is
    /// untouched and one error notice carries the server's message (or
    /// "Giriş başarısız"). A 401 is the exception when the API goes through
    /// `ApiClient`: its interceptor revokes the stored credentials before
    /// the error gets here, so a previous session ends with it.
    ///
    /// # Errors
    /// [`AuthError`] describing the failure; its message is user-facing.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<User, AuthError> {
        let _in_flight = InFlight::enter(&self.shared.authenticating);
        let request = LoginRequest::new(identifier, secret);
        let result = self.api.login(&request).await;
        self.establish(result, messages::LOGIN_SUCCEEDED, messages::LOGIN_FAILED)
            .await
    }

    /// Creates an account and signs in with it, with the same outcome
    /// rules as [`SessionStore::login`].
    ///
    /// # Errors
    /// [`AuthError`]; duplicate national id, phone or e-mail come back as
    /// `Rejected` with the server's message.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        let _in_flight = InFlight::enter(&self.shared.authenticating);
        let result = self.api.register(request).await;
        self.establish(result, messages::REGISTER_SUCCEEDED, messages::REGISTER_FAILED)
            .await
    }

    async fn establish(
        &self,
        result: Result<AuthResponse, TransportError>,
        succeeded: &str,
        failed: &str,
    ) -> Result<User, AuthError> {
        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(self.fail(AuthError::from_transport(e, failed))),
        };

        let mut data = self.shared.data.write().await;
        if let Err(source) = self
            .shared
            .tokens
            .save(&response.token, self.shared.config.token_ttl)
            .await
        {
            drop(data);
            return Err(self.fail(AuthError::Storage {
                message: failed.to_string(),
                source,
            }));
        }
        data.token = Some(response.token);
        data.user = Some(response.user.clone());
        data.generation += 1;
        drop(data);

        tracing::info!(user_id = %response.user.id, "signed in");
        self.shared.notifier.emit(Notice::success(succeeded));
        Ok(response.user)
    }

    fn fail(&self, err: AuthError) -> AuthError {
        tracing::warn!(error = %err, status = ?err.status(), "authentication failed");
        self.shared.notifier.emit(Notice::error(err.message()));
        err
    }

    /// Ends the session unconditionally. Always succeeds from the caller's
    /// point of view and always emits one notice, even if nobody was
    /// signed in.
    pub async fn logout(&self) {
        let had_token = self.shared.end(None).await.unwrap_or(false);
        tracing::info!(had_token, "signed out");
        self.shared.notifier.emit(Notice::info(messages::LOGGED_OUT));
    }

    /// Sends profile changes. The returned profile replaces the stored one,
    /// unless the session ended or changed while the request was out.
    ///
    /// A 401/403 ends the session (one "session expired" notice); other
    /// failures leave it alone and emit one error notice.
    ///
    /// # Errors
    /// [`AuthError`] from the update request.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, AuthError> {
        let generation = self.shared.data.read().await.generation;
        match self.api.update_profile(update).await {
            Ok(user) => {
                {
                    let mut data = self.shared.data.write().await;
                    if data.generation == generation && data.token.is_some() {
                        data.user = Some(user.clone());
                    } else {
                        tracing::debug!("session changed during profile update, not applying");
                    }
                }
                tracing::info!(user_id = %user.id, "profile updated");
                self.shared.notifier.emit(Notice::success(messages::PROFILE_UPDATED));
                Ok(user)
            }
            Err(e) => {
                let err = AuthError::from_transport(e, messages::PROFILE_UPDATE_FAILED);
                if err.is_auth_rejection() {
                    self.shared.expire(Some(generation)).await;
                } else {
                    tracing::warn!(error = %err, "profile update failed");
                    self.shared.notifier.emit(Notice::error(err.message()));
                }
                Err(err)
            }
        }
    }
}
