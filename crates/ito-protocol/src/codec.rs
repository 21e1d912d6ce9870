//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The handler only ever talks to a [`Codec`]; [`JsonCodec`] is the one the
//! browser client speaks. A different encoding can be dropped in without
//! touching the room or session layers.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientEvent, ClientFrame, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task through the server state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Decodes an inbound client frame: the event itself plus the optional
    /// `ack` correlation id that sits next to it.
    ///
    /// The event enum ignores keys it doesn't know, so the same bytes are
    /// read twice rather than flattening the two shapes into one type.
    fn decode_frame(&self, data: &[u8]) -> Result<ClientFrame, ProtocolError> {
        let event: ClientEvent = self.decode(data)?;
        let AckOnly { ack } = self.decode(data)?;
        Ok(ClientFrame { ack, event })
    }

    /// Reads only the `ack` id, ignoring whatever else the frame holds.
    ///
    /// Used to answer a request whose event could not be decoded. Returns
    /// `None` when the frame has no usable `ack`.
    fn decode_ack(&self, data: &[u8]) -> Option<u64> {
        self.decode::<AckOnly>(data).ok().and_then(|frame| frame.ack)
    }
}

#[derive(serde::Deserialize)]
struct AckOnly {
    #[serde(default)]
    ack: Option<u64>,
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use ito_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = codec
///     .decode_frame(br#"{"event":"getRoomInfo","data":{"roomCode":"ab12c"},"ack":4}"#)
///     .unwrap();
///
/// assert_eq!(frame.ack, Some(4));
/// assert!(matches!(frame.event, ClientEvent::GetRoomInfo { .. }));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    #[test]
    fn test_decode_frame_without_ack_is_fire_and_forget() {
        let frame = JsonCodec
            .decode_frame(br#"{"event":"finishGame","data":{"roomCode":"ABCDE"}}"#)
            .expect("should decode");
        assert_eq!(frame.ack, None);
        assert!(matches!(frame.event, ClientEvent::FinishGame { .. }));
    }

    #[test]
    fn test_decode_frame_unknown_event_returns_decode_error() {
        let result = JsonCodec.decode_frame(br#"{"event":"explode","data":{}}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_frame_null_player_name_decodes_as_empty() {
        let frame = JsonCodec
            .decode_frame(br#"{"event":"createRoom","data":{"playerName":null},"ack":1}"#)
            .expect("should decode");
        assert_eq!(frame.ack, Some(1));
        assert_eq!(
            frame.event,
            ClientEvent::CreateRoom {
                player_name: String::new()
            }
        );
    }

    #[test]
    fn test_decode_ack_unknown_event_still_yields_ack() {
        let data = br#"{"event":"explode","data":{},"ack":7}"#;
        assert!(JsonCodec.decode_frame(data).is_err());
        assert_eq!(JsonCodec.decode_ack(data), Some(7));
    }

    #[test]
    fn test_decode_ack_missing_or_garbage_is_none() {
        assert_eq!(JsonCodec.decode_ack(br#"{"event":"explode"}"#), None);
        assert_eq!(JsonCodec.decode_ack(br#"{"ack":"seven"}"#), None);
        assert_eq!(JsonCodec.decode_ack(b"not json"), None);
    }

    #[test]
    fn test_decode_frame_garbage_returns_decode_error() {
        let result = JsonCodec.decode_frame(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
