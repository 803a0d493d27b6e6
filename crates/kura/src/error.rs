//! Unified error type for the Kura client.

use kura_guard::Denial;
use kura_protocol::ProtocolError;
use kura_session::{AuthError, StorageError};
use kura_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum KuraError {
    /// HTTP-level failure: network, status, bad origin.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body didn't match its schema.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The token store couldn't be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Login, registration or a profile operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The user isn't allowed to do this.
    #[error(transparent)]
    Denied(#[from] Denial),

    #[error("nobody is signed in")]
    SignedOut,
}

impl KuraError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(e) => e.message().to_string(),
            Self::Transport(e) => e
                .server_message()
                .map_or_else(|| e.to_string(), str::to_string),
            other => other.to_string(),
        }
    }
}
