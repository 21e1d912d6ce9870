//! Session types: what the server remembers about a live connection.
//!
//! A connection becomes a player only after it creates or joins a room.
//! From then on the server needs to know:
//! - WHICH connection it is (`ConnectionId`)
//! - WHO the player is (`PlayerId`, display name)
//! - WHERE they are (`RoomCode`)
//!
//! so that a dropped socket can be turned into a room departure.

use ito_protocol::{PlayerId, RoomCode};
use ito_transport::ConnectionId;

/// The player identity a connection acquired when it entered a room.
///
/// There is no grace period: when the connection closes the binding is
/// taken and the player is removed from the room immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionBinding {
    pub connection_id: ConnectionId,
    pub player_id: PlayerId,
    pub room_code: RoomCode,
    /// Name as stored in the room (trimmed).
    pub player_name: String,
}

impl ConnectionBinding {
    pub fn new(
        connection_id: ConnectionId,
        player_id: PlayerId,
        room_code: RoomCode,
        player_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_id,
            player_id,
            room_code,
            player_name: player_name.into(),
        }
    }
}
