//! Session types: what the rest of the application gets to see.
//!
//! The store keeps its own internal record; callers only ever receive a
//! [`SessionSnapshot`], a consistent copy taken under the lock.

use std::fmt;
use std::time::Duration;

use kura_protocol::User;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunables for the session store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a persisted token. The server's own expiry still wins:
    /// a token past this age is simply never sent.
    ///
    /// Default: 7 days.
    pub token_ttl: Duration,

    /// How many notices a slow subscriber may lag behind before it starts
    /// missing them.
    ///
    /// Default: 32.
    pub notice_capacity: usize,
}

impl SessionConfig {
    pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    pub const DEFAULT_NOTICE_CAPACITY: usize = 32;
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_ttl: Self::DEFAULT_TOKEN_TTL,
            notice_capacity: Self::DEFAULT_NOTICE_CAPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
///                 ┌──────────── no stored token ───────────┐
///                 │                                        ▼
///   Initializing ─┼─ token + profile ──→ Authenticated   Anonymous
///                 │                          │   ▲           │
///                 └─ token, fetch failed ──→ │   │           │
///                      ProfileUnavailable    │   └─ login ───┘
///                                            │
///                     logout / 401 / 403 ────┴──→ Anonymous
/// ```
///
/// `Authenticating` is reported while a login or register call is in
/// flight, whatever the previous phase was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// The stored token hasn't been checked against the server yet.
    Initializing,
    /// A login or register request is pending.
    Authenticating,
    /// Token and profile are both known.
    Authenticated,
    /// There is a token but the profile couldn't be fetched (network or
    /// server trouble). The token is kept; the next protected call decides.
    ProfileUnavailable,
    /// No token.
    Anonymous,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::ProfileUnavailable => "profile-unavailable",
            Self::Anonymous => "anonymous",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// A point-in-time copy of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<User>,
    /// `true` until the startup check has finished.
    pub loading: bool,
}

impl SessionSnapshot {
    /// Logged in means a token is present. A missing profile doesn't
    /// matter here.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    pub fn phase(&self, authenticating: bool) -> SessionPhase {
        if self.loading {
            SessionPhase::Initializing
        } else if authenticating {
            SessionPhase::Authenticating
        } else {
            match (&self.token, &self.user) {
                (Some(_), Some(_)) => SessionPhase::Authenticated,
                (Some(_), None) => SessionPhase::ProfileUnavailable,
                (None, _) => SessionPhase::Anonymous,
            }
        }
    }
}
