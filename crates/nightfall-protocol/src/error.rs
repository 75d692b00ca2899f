//! Error types for the protocol layer.

/// Errors raised while turning messages into bytes and back.
///
/// Anything in this enum means the problem is in the framing, not in the
/// game: a client sent malformed JSON, or a value could not be encoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// unknown event tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The bytes parsed but break a protocol rule (e.g. an empty room code).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
