//! The request pipeline: build → attach credential → send → intercept.

use kura_protocol::{Codec, ErrorBody, JsonCodec};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{
    ApiOrigin, ClientConfig, CredentialProvider, LOGIN_PATH, Navigator, TransportError,
};

const JSON: &str = "application/json";

/// Single point of egress to the backend.
///
/// Generic over where credentials come from (`C`), how navigation happens
/// (`N`), and how bodies are (de)serialized (`K`, JSON by default).
pub struct ApiClient<C, N, K = JsonCodec> {
    http: reqwest::Client,
    origin: ApiOrigin,
    credentials: C,
    navigator: N,
    codec: K,
}

impl<C, N> ApiClient<C, N, JsonCodec>
where
    C: CredentialProvider,
    N: Navigator,
{
    /// Resolves the origin from `config` and builds the HTTP client.
    ///
    /// # Errors
    /// [`TransportError::InvalidOrigin`] for a bad override,
    /// [`TransportError::ClientBuild`] if reqwest can't initialize.
    pub fn new(
        config: &ClientConfig,
        credentials: C,
        navigator: N,
    ) -> Result<Self, TransportError> {
        Self::with_codec(config, credentials, navigator, JsonCodec)
    }
}

impl<C, N, K> ApiClient<C, N, K>
where
    C: CredentialProvider,
    N: Navigator,
    K: Codec,
{
    /// Like [`ApiClient::new`] with an explicit codec.
    ///
    /// # Errors
    /// See [`ApiClient::new`].
    pub fn with_codec(
        config: &ClientConfig,
        credentials: C,
        navigator: N,
        codec: K,
    ) -> Result<Self, TransportError> {
        let origin = config.resolve_origin()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(TransportError::ClientBuild)?;

        tracing::info!(%origin, "API client ready");
        Ok(Self {
            http,
            origin,
            credentials,
            navigator,
            codec,
        })
    }

    pub fn origin(&self) -> &ApiOrigin {
        &self.origin
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.send(Method::GET, path, &[], None::<&()>).await
    }

    /// `GET path?query` and decode the JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        self.send(Method::GET, path, query, None::<&()>).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    /// Runs the full pipeline and decodes a 2xx body into `T`.
    ///
    /// # Errors
    /// - [`TransportError::Network`] if no response arrived
    /// - [`TransportError::Status`] for any non-2xx status (after the 401
    ///   interceptor has run)
    /// - [`TransportError::Decode`] if the 2xx body doesn't fit `T`
    pub async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, TransportError> {
        let (status, bytes) = self.execute(method, path, query, body).await?;
        if !status.is_success() {
            let message = self
                .codec
                .decode::<ErrorBody>(&bytes)
                .ok()
                .and_then(ErrorBody::into_message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(self.codec.decode(&bytes)?)
    }

    /// Runs the pipeline without decoding and returns the raw status.
    /// Interceptors still apply.
    ///
    /// # Errors
    /// [`TransportError::Network`] if no response arrived.
    pub async fn status_of(&self, method: Method, path: &str) -> Result<u16, TransportError> {
        let (status, _) = self.execute(method, path, &[], None::<&()>).await?;
        Ok(status.as_u16())
    }

    async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(StatusCode, Vec<u8>), TransportError> {
        let url = self.origin.join(path);
        let mut request = self.http.request(method.clone(), url).header(ACCEPT, JSON);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            let bytes = self.codec.encode(body)?;
            request = request.header(CONTENT_TYPE, JSON).body(bytes);
        }

        // Outgoing interceptor. A missing token is not an error: the
        // server decides whether the endpoint needs one.
        let authenticated = match self.credentials.bearer_token().await {
            Some(token) => {
                request = request.bearer_auth(token);
                true
            }
            None => false,
        };

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "request failed");
            TransportError::Network(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(TransportError::Network)?;

        tracing::debug!(%method, path, status = status.as_u16(), authenticated, "API response");

        // Incoming interceptor.
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, path, "credential rejected, returning to login");
            self.credentials.revoke().await;
            self.navigator.navigate(LOGIN_PATH);
        }

        Ok((status, bytes.to_vec()))
    }
}
