//! Route guard for the Kura portal.
//!
//! Decides, from a [`SessionSnapshot`](kura_session::SessionSnapshot),
//! whether a view may be shown, should wait for the startup check, or must
//! send the user somewhere else.

mod decision;
mod route;

pub use decision::{Denial, GuardDecision, can_submit_application, guard, guard_route};
pub use route::{Access, Route};
