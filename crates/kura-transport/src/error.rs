use kura_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured API origin is not an absolute http(s) URL.
    #[error("invalid API origin: {0}")]
    InvalidOrigin(String),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request never produced a response (DNS, refused, timeout, ...).
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    ///
    /// `message` is the server's `{error}` / `{message}` text when the body
    /// carried one.
    #[error("server responded with HTTP {status}")]
    Status { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error(transparent)]
    Decode(#[from] ProtocolError),
}

impl TransportError {
    /// HTTP status of the response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401: the credential was missing, invalid or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// 401 or 403: the server rejected who we are, not what we sent.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// The server-supplied error text, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let unauthorized = TransportError::Status { status: 401, message: None };
        assert!(unauthorized.is_unauthorized());
        assert!(unauthorized.is_auth_rejection());

        let forbidden = TransportError::Status { status: 403, message: None };
        assert!(!forbidden.is_unauthorized());
        assert!(forbidden.is_auth_rejection());

        let bad_request = TransportError::Status {
            status: 400,
            message: Some("Giriş başarısız".into()),
        };
        assert!(!bad_request.is_auth_rejection());
        assert_eq!(bad_request.server_message(), Some("Giriş başarısız"));
        assert_eq!(bad_request.to_string(), "server responded with HTTP 400");
    }

    #[test]
    fn test_non_status_errors_have_no_status() {
        let err = TransportError::InvalidOrigin("ftp://x".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_auth_rejection());
        assert_eq!(err.server_message(), None);
    }
}
