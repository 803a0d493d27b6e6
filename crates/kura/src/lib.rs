//! # Kura
//!
//! Client for the Aile Hekimliği Kura Sistemi portal API.
//!
//! The [`Portal`] ties the layers together: a typed HTTP client that
//! attaches the session's bearer token and ends the session on 401, a
//! session store that persists the token and keeps the profile, and a
//! route guard that decides which views may be shown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kura::prelude::*;
//!
//! # async fn run() -> Result<(), KuraError> {
//! let portal = Portal::from_config(&PortalConfig::from_env(), NullNavigator)?;
//! portal.start().await;
//! portal.session().login("12345678901", "123456").await?;
//! let rows = portal.api().kura_list(&KuraFilter::default()).await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod portal;
mod telemetry;

pub use config::{DEFAULT_TOKEN_FILE, ENV_COOKIE, ENV_TOKEN_FILE, PortalConfig, PortalTokenStore};
pub use error::KuraError;
pub use portal::{Portal, PortalBuilder, PortalSession};
pub use telemetry::init_tracing;

pub use kura_guard as guard;
pub use kura_protocol as protocol;
pub use kura_session as session;
pub use kura_transport as transport;

pub mod prelude {
    pub use crate::{
        KuraError, Portal, PortalBuilder, PortalConfig, PortalTokenStore, init_tracing,
    };
    pub use kura_guard::{Access, Denial, GuardDecision, Route, guard, guard_route};
    pub use kura_protocol::{
        Application, ApplicationFormRequest, ApplicationFormResponse, ApplicationStatus,
        KuraEntry, KuraFilter, KuraOrder, PreferenceStatus, ProfileUpdate, ProtocolError,
        RecordId, RegisterRequest, Role, User,
    };
    pub use kura_session::{
        AuthError, CookieTokenStore, FallbackTokenStore, FileTokenStore, MemoryTokenStore,
        Notice, NoticeLevel, SessionConfig, SessionPhase, SessionSnapshot, SessionStore,
        TokenStore,
    };
    pub use kura_transport::{
        ApiClient, ClientConfig, CredentialProvider, Navigator, NullNavigator,
        RecordingNavigator, TransportError,
    };
}
