//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum, so a
//! `ProtocolError` always means a frame could not be turned into (or out
//! of) bytes, never a room or networking problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event name,
    /// or a payload of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
