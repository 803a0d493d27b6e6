//! Session state for the Kura portal client.
//!
//! This crate answers "who is signed in" for the rest of the application:
//!
//! 1. **Persistence**: the bearer token survives restarts in a
//!    [`TokenStore`] (file, cookie jar, memory, or a fallback chain).
//! 2. **Lifecycle**: [`SessionStore`] runs the startup check, login,
//!    registration, logout and profile updates, and keeps token and profile
//!    consistent.
//! 3. **Feedback**: each state change emits one [`Notice`] for the UI.
//!
//! # How it fits in the stack
//!
//! ```text
//! Route guard (above)   ← reads SessionSnapshot
//!     ↕
//! Session (this crate)  ← owns token + profile, emits notices
//!     ↕
//! Transport (below)     ← asks SessionCredentials for the token, reports 401s
//! ```

mod auth;
mod error;
mod notice;
mod session;
mod store;
mod token_store;

pub use auth::AuthApi;
pub use error::{AuthError, StorageError};
pub use notice::{Notice, NoticeLevel, messages};
pub use session::{SessionConfig, SessionPhase, SessionSnapshot};
pub use store::{SessionCredentials, SessionStore};
pub use token_store::{
    CookieTokenStore, FallbackTokenStore, FileTokenStore, MemoryTokenStore, StoredToken,
    TOKEN_COOKIE, TokenStore,
};
