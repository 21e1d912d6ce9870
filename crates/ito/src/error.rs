//! Unified error type for the ITO server.

use ito_protocol::ProtocolError;
use ito_room::RoomError;
use ito_session::SessionError;
use ito_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so `?`
/// converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ItoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unbound connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (bad config, not found, conflict).
    #[error(transparent)]
    Room(#[from] RoomError),
}
