//! `Portal` builder: wires the layers together.
//!
//! ```text
//! Portal
//!   ├─ SessionStore ── owns token + profile
//!   │     └─ ApiClient ── SessionCredentials (token in, 401 out)
//!   │                  └─ Navigator (shared with the portal)
//!   └─ route guard ── open(path) decides, navigates, announces
//!                   └─ submit_application: phone gate, then the form
//! ```

use std::sync::Arc;

use kura_guard::{GuardDecision, Route, can_submit_application, guard_route};
use kura_protocol::{ApplicationFormRequest, ApplicationFormResponse, User};
use kura_session::{
    Notice, SessionConfig, SessionCredentials, SessionSnapshot, SessionStore, TokenStore,
    messages,
};
use kura_transport::{ApiClient, ClientConfig, Navigator, NullNavigator};

use crate::{KuraError, PortalConfig, PortalTokenStore};

/// The session store as the portal builds it.
pub type PortalSession<S, N> = SessionStore<ApiClient<SessionCredentials<S>, Arc<N>>, S>;

/// Builder for a [`Portal`].
///
/// ```rust
/// use kura::prelude::*;
///
/// # fn main() -> Result<(), KuraError> {
/// let portal = Portal::builder()
///     .client_config(ClientConfig::default().with_api_url("http://localhost:5000"))
///     .build(MemoryTokenStore::new(), NullNavigator)?;
/// # let _ = portal;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PortalBuilder {
    client_config: ClientConfig,
    session_config: SessionConfig,
}

impl PortalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Builds the HTTP client and the session store around `tokens`.
    /// The store still has to be started with [`Portal::start`].
    ///
    /// # Errors
    /// [`KuraError::Transport`] if the API origin is invalid or the HTTP
    /// client can't be created.
    pub fn build<S, N>(self, tokens: S, navigator: N) -> Result<Portal<S, N>, KuraError>
    where
        S: TokenStore,
        N: Navigator,
    {
        let navigator = Arc::new(navigator);
        let session = SessionStore::try_new(tokens, self.session_config, |credentials| {
            ApiClient::new(&self.client_config, credentials, Arc::clone(&navigator))
        })?;
        Ok(Portal { session, navigator })
    }
}

/// A ready-to-use client: session, typed API and route guard.
pub struct Portal<S, N> {
    session: PortalSession<S, N>,
    navigator: Arc<N>,
}

impl Portal<PortalTokenStore, NullNavigator> {
    pub fn builder() -> PortalBuilder {
        PortalBuilder::new()
    }
}

impl<N: Navigator> Portal<PortalTokenStore, N> {
    /// Builds a portal from `config`, storing the token in its file with
    /// the cookie as fallback.
    ///
    /// # Errors
    /// See [`PortalBuilder::build`].
    pub fn from_config(config: &PortalConfig, navigator: N) -> Result<Self, KuraError> {
        PortalBuilder::new()
            .client_config(config.client.clone())
            .session_config(config.session.clone())
            .build(config.token_store(), navigator)
    }
}

impl<S: TokenStore, N: Navigator> Portal<S, N> {
    /// Runs the startup check. See [`SessionStore::initialize`].
    pub async fn start(&self) -> SessionSnapshot {
        self.session.initialize().await
    }

    pub fn session(&self) -> &PortalSession<S, N> {
        &self.session
    }

    /// The typed endpoints, authenticated with the current session.
    pub fn api(&self) -> &ApiClient<SessionCredentials<S>, Arc<N>> {
        self.session.api()
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Decides what to do with a request for `path`.
    ///
    /// On a redirect the navigator is sent to the target, and a denial (if
    /// any) is announced on the session's notice channel.
    pub async fn open(&self, path: &str) -> (Route, GuardDecision) {
        let route = Route::from_path(path);
        let decision = guard_route(route, &self.session.snapshot().await);
        if let GuardDecision::Redirect { to, denial } = decision {
            if let Some(denial) = denial {
                self.session.announce(Notice::error(denial.to_string()));
            }
            self.navigator.navigate(to.path());
        }
        (route, decision)
    }

    /// The signed-in user, if they may submit a lottery application.
    ///
    /// # Errors
    /// [`KuraError::SignedOut`] without a profile;
    /// [`KuraError::Denied`] (also announced) with an unverified phone.
    pub async fn check_application(&self) -> Result<User, KuraError> {
        let user = self.session.snapshot().await.user.ok_or(KuraError::SignedOut)?;
        if let Err(denial) = can_submit_application(&user) {
            self.session.announce(Notice::error(denial.to_string()));
            return Err(denial.into());
        }
        Ok(user)
    }

    /// Submits the application form once the phone-verification gate
    /// passes. Success announces one notice; a failure other than 401
    /// announces one error notice (a 401 has already ended the session).
    ///
    /// # Errors
    /// Everything [`Portal::check_application`] returns, plus
    /// [`KuraError::Transport`] from the submission.
    pub async fn submit_application(
        &self,
        form: &ApplicationFormRequest,
    ) -> Result<ApplicationFormResponse, KuraError> {
        let user = self.check_application().await?;
        match self.api().submit_application_form(form).await {
            Ok(response) => {
                if response.success {
                    tracing::info!(
                        user_id = %user.id,
                        pdf = ?response.pdf_path,
                        "application submitted"
                    );
                    self.session.announce(Notice::success(messages::APPLICATION_SUBMITTED));
                }
                Ok(response)
            }
            Err(e) => {
                if !e.is_unauthorized() {
                    tracing::warn!(error = %e, "application submission failed");
                    let message = e.server_message().unwrap_or(messages::APPLICATION_FAILED);
                    self.session.announce(Notice::error(message));
                }
                Err(e.into())
            }
        }
    }
}
