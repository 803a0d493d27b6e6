//! Codec trait and the JSON implementation used by the portal API.
//!
//! A "codec" converts between Rust types and raw bytes. The transport layer
//! only talks to the [`Codec`] trait, so tests can swap in a codec that
//! records or rejects payloads without touching the HTTP code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes request bodies and decodes response bodies.
///
/// `Send + Sync + 'static` because the codec lives inside the HTTP client,
/// which is shared between tasks for the lifetime of the session.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`. The backend speaks JSON only.
///
/// ```rust
/// use kura_protocol::{Codec, JsonCodec, ProfileResponse};
///
/// let body = r#"{"user":{"id":1,"ad":"Ayşe","role":"admin"}}"#.as_bytes();
/// let decoded: ProfileResponse = JsonCodec.decode(body).unwrap();
/// assert!(decoded.user.is_admin());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthResponse, LoginRequest};

    #[test]
    fn test_encode_login_request_uses_wire_field_names() {
        let req = LoginRequest::new("12345678901", "123456");
        let bytes = JsonCodec.encode(&req).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["username"], "12345678901");
        assert_eq!(value["password"], "123456");
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<AuthResponse, _> = JsonCodec.decode(b"<html>");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_token_returns_decode_error() {
        let result: Result<AuthResponse, _> =
            JsonCodec.decode(br#"{"user":{"id":7}}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
