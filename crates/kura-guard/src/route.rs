//! The portal's views and who may open them.

use std::fmt;

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Needs a loaded profile.
    Authenticated,
    /// Needs a loaded profile with the admin role.
    Admin,
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A view of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Profile,
    KuraList,
    ApplicationForm,
    MyApplications,
    EmptyPositions,
    Admin,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::Profile,
        Route::KuraList,
        Route::ApplicationForm,
        Route::MyApplications,
        Route::EmptyPositions,
        Route::Admin,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/",
            Self::Profile => "/profile",
            Self::KuraList => "/kura-listesi",
            Self::ApplicationForm => "/basvuru-formu",
            Self::MyApplications => "/basvurularim",
            Self::EmptyPositions => "/bos-pozisyonlar",
            Self::Admin => "/admin",
        }
    }

    /// Resolves a location to a route. Query string, fragment and a
    /// trailing slash are ignored; anything unknown lands on the dashboard.
    pub fn from_path(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Self::Dashboard)
    }

    pub fn access(self) -> Access {
        match self {
            Self::Login | Self::Register => Access::Public,
            Self::Admin => Access::Admin,
            _ => Access::Authenticated,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
