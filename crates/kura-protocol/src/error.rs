//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the bytes were fine at the HTTP level but
//! did not match the shape we expected.

/// Errors that can occur while encoding requests or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a request body failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The response body was not valid JSON, or did not have the fields
    /// the target type requires.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but breaks a rule of the API contract,
    /// e.g. an auth response carrying an empty token.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
