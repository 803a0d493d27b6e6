//! HTTP client wrapper for the Kura portal API.
//!
//! Every call to the backend leaves through [`ApiClient`]. It owns two
//! cross-cutting behaviours:
//!
//! - **Outgoing**: ask a [`CredentialProvider`] for the current token and
//!   attach it as `Authorization: Bearer <token>`.
//! - **Incoming**: on HTTP 401, call [`CredentialProvider::revoke`] and send
//!   the viewer to the login route through a [`Navigator`], then hand the
//!   error back to the caller as usual.
//!
//! The session layer implements `CredentialProvider`; the presentation
//! layer implements `Navigator`. Neither is a global.

mod api;
mod client;
mod config;
mod error;
mod origin;

pub use api::paths;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::TransportError;
pub use origin::{ApiOrigin, DEFAULT_API_PORT};

use std::future::Future;
use std::sync::{Mutex, PoisonError};

/// Route the viewer is sent to when the server rejects their credential.
pub const LOGIN_PATH: &str = "/login";

/// Supplies the bearer token for outgoing requests and is told when the
/// server has rejected it.
///
/// `Send + Sync + 'static` because the provider lives inside the client,
/// which is shared by every task that talks to the backend.
pub trait CredentialProvider: Send + Sync + 'static {
    /// Returns the token to attach, or `None` to send the request
    /// unauthenticated.
    fn bearer_token(&self) -> impl Future<Output = Option<String>> + Send;

    /// Called once per 401 response, before the error reaches the caller.
    fn revoke(&self) -> impl Future<Output = ()> + Send;
}

/// Client-side navigation.
pub trait Navigator: Send + Sync + 'static {
    /// Replace the current view with the one at `path`.
    fn navigate(&self, path: &str);
}

/// Never attaches a token. For public endpoints and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    async fn bearer_token(&self) -> Option<String> {
        None
    }

    async fn revoke(&self) {}
}

/// A token fixed at construction, cleared on revoke.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: tokio::sync::RwLock<Option<String>>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: tokio::sync::RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn revoke(&self) {
        self.token.write().await.take();
    }
}

/// Ignores navigation requests. For headless callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigation ignored");
    }
}

/// Remembers every navigation request, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All paths navigated to so far.
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent path, if any.
    pub fn current(&self) -> Option<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

impl<T: Navigator> Navigator for std::sync::Arc<T> {
    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

impl<T: CredentialProvider> CredentialProvider for std::sync::Arc<T> {
    fn bearer_token(&self) -> impl Future<Output = Option<String>> + Send {
        (**self).bearer_token()
    }

    fn revoke(&self) -> impl Future<Output = ()> + Send {
        (**self).revoke()
    }
}
