//! The backend calls the session store depends on.
//!
//! [`SessionStore`](crate::SessionStore) never talks HTTP itself. It goes
//! through [`AuthApi`], which the transport's `ApiClient` implements and
//! which tests replace with a scripted fake.

use std::future::Future;

use kura_protocol::{AuthResponse, Codec, LoginRequest, ProfileUpdate, RegisterRequest, User};
use kura_transport::{ApiClient, CredentialProvider, Navigator, TransportError};

/// Account endpoints used by the session lifecycle.
pub trait AuthApi: Send + Sync + 'static {
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, TransportError>> + Send;

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthResponse, TransportError>> + Send;

    /// Profile of whoever the current credential belongs to.
    fn fetch_profile(&self) -> impl Future<Output = Result<User, TransportError>> + Send;

    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, TransportError>> + Send;
}

impl<C, N, K> AuthApi for ApiClient<C, N, K>
where
    C: CredentialProvider,
    N: Navigator,
    K: Codec,
{
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, TransportError>> + Send {
        ApiClient::login(self, request)
    }

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthResponse, TransportError>> + Send {
        ApiClient::register(self, request)
    }

    fn fetch_profile(&self) -> impl Future<Output = Result<User, TransportError>> + Send {
        ApiClient::fetch_profile(self)
    }

    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, TransportError>> + Send {
        ApiClient::update_profile(self, update)
    }
}
