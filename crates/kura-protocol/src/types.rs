//! Account and authentication payloads.
//!
//! The backend's JSON uses Turkish field names (`ad`, `soyad`, `telefon`,
//! ...). The Rust structs use English names and map them with
//! `#[serde(rename = "...")]`; where the backend has emitted both camelCase
//! and snake_case spellings over time, the other spelling is accepted with
//! `#[serde(alias = "...")]`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of a server-side record.
///
/// Depending on the database behind the API this is either a number
/// (SQLite rows) or a string (Mongo object ids). `untagged` lets serde try
/// each shape in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Authorization role of a portal user.
///
/// Anything the client doesn't recognise is treated as a regular user, so
/// a new server-side role can never accidentally unlock the admin views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parses the wire representation, falling back to [`Role::User`].
    pub fn from_wire(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_wire).unwrap_or_default())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// The authenticated physician's profile as returned by the server.
///
/// The session layer replaces this value wholesale on every login,
/// registration and profile update. Fields the client has no use for are
/// kept in [`User::extra`] so nothing the server sent is lost when the
/// profile is handed on to a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: RecordId,

    #[serde(
        rename = "tcKimlik",
        alias = "tc_kimlik",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub national_id: Option<String>,

    #[serde(rename = "ad", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "soyad", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "telefon", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(rename = "unvan", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub role: Role,

    /// Gates the application-submission capability.
    #[serde(rename = "telefonDogrulanmis", alias = "telefon_dogrulanmis", default)]
    pub phone_verified: bool,

    #[serde(rename = "emailDogrulanmis", alias = "email_dogrulanmis", default)]
    pub email_verified: bool,

    /// Every field not modelled above, verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Creates a profile with only an id set. Handy for fakes and tests.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            national_id: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            title: None,
            role: Role::User,
            phone_verified: false,
            email_verified: false,
            extra: Map::new(),
        }
    }

    /// Returns `true` if the user may open the admin views.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// "Ad Soyad", or whichever half is known.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /api/auth/login`.
///
/// `username` may be a national id, a phone number or an e-mail address;
/// the server decides which.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "tcKimlik")]
    pub national_id: String,
    #[serde(rename = "telefon")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "sifre")]
    pub password: String,
    #[serde(rename = "ad")]
    pub first_name: String,
    #[serde(rename = "soyad")]
    pub last_name: String,
}

/// Body of `PUT /api/user/profile`. Only the fields that are `Some` are
/// sent; the server leaves the others untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "ad", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "soyad", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "dogum_tarihi", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(rename = "dogum_yeri", skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(rename = "sicil_no", skip_serializing_if = "Option::is_none")]
    pub registry_number: Option<String>,
    #[serde(rename = "unvan", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "mezun_universite", skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(rename = "uyum_egitimi_sertifika", skip_serializing_if = "Option::is_none")]
    pub orientation_certificate: Option<String>,
}

impl ProfileUpdate {
    /// Returns `true` if no field would be sent.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Successful login or registration: `{token, user}`.
///
/// Other fields (`success`, `message`, `accessToken`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl AuthResponse {
    /// Rejects responses whose token can't be used as a bearer credential.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if the token is blank or contains
    /// whitespace.
    pub fn validate(self) -> Result<Self, ProtocolError> {
        if self.token.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "auth response carried an empty token".into(),
            ));
        }
        if self.token.chars().any(char::is_whitespace) {
            return Err(ProtocolError::InvalidMessage("auth token contains whitespace".into()));
        }
        Ok(self)
    }
}

/// `GET`/`PUT /api/user/profile` response: `{user}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}

/// Body of a non-2xx response. The backend uses `error` for most failures
/// and `message` for a few.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The server-supplied message, `error` preferred over `message`.
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Generic `{success, message}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
