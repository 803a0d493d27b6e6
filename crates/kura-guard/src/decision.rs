//! Guard decisions over a session snapshot.
//!
//! Everything here is a pure function of its inputs: the guard never
//! touches the session, it only says what the view should do.
//!
//! ```text
//!   loading ──────────────→ Wait
//!   no profile ───────────→ Redirect(/login)
//!   profile ──┬─ admin route, not admin ─→ Redirect(/, NotAdmin)
//!             └─ otherwise ──────────────→ Render
//! ```

use kura_protocol::User;
use kura_session::SessionSnapshot;

use crate::{Access, Route};

/// Why access to a view or action was refused. `Display` is the message
/// shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Bu sayfaya erişim yetkiniz yok")]
    NotAdmin,

    #[error("Başvuru yapmak için telefon numaranızı doğrulamalısınız")]
    PhoneNotVerified,
}

/// What a protected view should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Startup check still running: show a placeholder.
    Wait,
    /// Go elsewhere instead. `denial` is set when the user should be told
    /// why.
    Redirect { to: Route, denial: Option<Denial> },
    /// Show the view.
    Render,
}

impl GuardDecision {
    fn login() -> Self {
        Self::Redirect {
            to: Route::Login,
            denial: None,
        }
    }
}

/// The base check every protected view runs.
///
/// Note this looks at the profile, not the token: a session whose profile
/// couldn't be fetched is sent to the login page.
pub fn guard(snapshot: &SessionSnapshot) -> GuardDecision {
    if snapshot.loading {
        GuardDecision::Wait
    } else if snapshot.user.is_none() {
        GuardDecision::login()
    } else {
        GuardDecision::Render
    }
}

/// [`guard`] plus the route's own access level.
pub fn guard_route(route: Route, snapshot: &SessionSnapshot) -> GuardDecision {
    let decision = match route.access() {
        Access::Public => GuardDecision::Render,
        Access::Authenticated => guard(snapshot),
        Access::Admin => match guard(snapshot) {
            GuardDecision::Render if !snapshot.is_admin() => GuardDecision::Redirect {
                to: Route::Dashboard,
                denial: Some(Denial::NotAdmin),
            },
            other => other,
        },
    };
    tracing::debug!(%route, ?decision, "route guard");
    decision
}

/// Whether `user` may submit a lottery application.
///
/// # Errors
/// [`Denial::PhoneNotVerified`] until the phone number is verified.
pub fn can_submit_application(user: &User) -> Result<(), Denial> {
    if user.phone_verified {
        Ok(())
    } else {
        Err(Denial::PhoneNotVerified)
    }
}
