//! Error types for the session layer.

use kura_transport::TransportError;

/// Errors from a [`TokenStore`](crate::TokenStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or deleting the backing file failed.
    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record could not be parsed or serialized.
    #[error("token storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Why a session operation failed.
///
/// Every variant carries the message shown to the user: the server's own
/// text when it sent one, otherwise a fixed fallback for the operation.
/// `Display` prints exactly that message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// No usable answer: network failure, timeout or a malformed body.
    #[error("{message}")]
    Unavailable {
        message: String,
        #[source]
        source: TransportError,
    },

    /// The token could not be persisted, so the session was left as is.
    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: StorageError,
    },
}

impl AuthError {
    /// Classifies a transport failure. `fallback` is used when the server
    /// didn't supply a message of its own.
    pub fn from_transport(err: TransportError, fallback: &str) -> Self {
        match err {
            TransportError::Status { status, message } => Self::Rejected {
                status,
                message: message.unwrap_or_else(|| fallback.to_string()),
            },
            other => Self::Unavailable {
                message: fallback.to_string(),
                source: other,
            },
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message, .. }
            | Self::Unavailable { message, .. }
            | Self::Storage { message, .. } => message,
        }
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 or 403.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
