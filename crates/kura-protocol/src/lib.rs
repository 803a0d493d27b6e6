//! Wire protocol for the Kura portal API.
//!
//! This crate defines the shapes that travel between the client and the
//! backend:
//!
//! - **Account types** ([`User`], [`AuthResponse`], [`LoginRequest`], etc.):
//!   the authentication and profile payloads the session layer relies on.
//! - **Lottery types** ([`KuraEntry`], [`Statistics`], [`Notification`],
//!   etc.): the read models behind the portal's lists and dashboard.
//! - **Application types** ([`ApplicationFormRequest`], [`Application`]):
//!   the lottery application form and the submitted records.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how response bodies are
//!   decoded and request bodies encoded.
//! - **Errors** ([`ProtocolError`]): what can go wrong at that boundary.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP or sessions. Responses are
//! narrowed into these explicit types at the transport boundary, so the
//! layers above never inspect raw JSON.
//!
//! ```text
//! Transport (HTTP bytes) → Protocol (typed payloads) → Session (auth state)
//! ```

mod application;
mod codec;
mod error;
mod lottery;
mod types;

pub use application::{
    Application, ApplicationFormRequest, ApplicationFormResponse, ApplicationStatus,
    ApplicationsResponse,
};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use lottery::{
    DistrictsResponse, EmptyPositionApplication, KuraEntry, KuraFilter,
    KuraOrder, ListResponse, Notification, NotificationsResponse,
    PreferenceRequest, PreferenceStatus, PreferencesResponse, RankInfo,
    RankResponse, Statistics, StatisticsResponse,
};
pub use types::{
    Ack, AuthResponse, ErrorBody, LoginRequest, ProfileResponse,
    ProfileUpdate, RecordId, RegisterRequest, Role, User,
};
