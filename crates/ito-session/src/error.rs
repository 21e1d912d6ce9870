//! Error types for the session layer.

use ito_transport::ConnectionId;

/// Errors that can occur while tracking connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection hasn't created or joined a room yet, so it has no
    /// player identity.
    #[error("connection {0} is not bound to a player")]
    NotBound(ConnectionId),
}
