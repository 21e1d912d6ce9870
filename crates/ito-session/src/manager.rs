//! The connection tracker: which connection plays as whom, and where.
//!
//! # Concurrency note
//!
//! `ConnectionTracker` is NOT thread-safe by itself — it uses a plain
//! `HashMap`. The server wraps it in a mutex next to the room registry,
//! and every method here is synchronous, so the lock is never held across
//! an await point.

use std::collections::HashMap;

use ito_transport::ConnectionId;

use crate::{ConnectionBinding, SessionError};

/// Maps live connections to the player each one currently acts as.
///
/// ## Lifecycle
///
/// ```text
/// connect ──→ (unbound) ──createRoom/joinRoom──→ bind() ──disconnect──→ unbind()
///                                   ↑                │
///                                   └── bind() again ┘  (overwrites)
/// ```
///
/// A connection holds at most one binding. Creating or joining a second
/// room replaces it; the player left behind in the first room stays there
/// until that room empties.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    bindings: HashMap<ConnectionId, ConnectionBinding>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a binding, replacing any earlier one for the same
    /// connection. Returns the replaced binding.
    pub fn bind(&mut self, binding: ConnectionBinding) -> Option<ConnectionBinding> {
        let connection_id = binding.connection_id;
        let previous = self.bindings.insert(connection_id, binding.clone());
        if let Some(prev) = &previous {
            tracing::warn!(
                %connection_id,
                old_player = %prev.player_id,
                old_room = %prev.room_code,
                new_room = %binding.room_code,
                "connection rebound; previous player stays in its room"
            );
        } else {
            tracing::debug!(
                %connection_id,
                player_id = %binding.player_id,
                room_code = %binding.room_code,
                "connection bound"
            );
        }
        previous
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&ConnectionBinding> {
        self.bindings.get(&connection_id)
    }

    /// Like [`get`](Self::get), but unbound connections are an error.
    ///
    /// # Errors
    /// Returns [`SessionError::NotBound`] if the connection never entered
    /// a room.
    pub fn require(&self, connection_id: ConnectionId) -> Result<&ConnectionBinding, SessionError> {
        self.get(connection_id)
            .ok_or(SessionError::NotBound(connection_id))
    }

    /// Removes and returns a connection's binding. Called on disconnect.
    pub fn unbind(&mut self, connection_id: ConnectionId) -> Option<ConnectionBinding> {
        self.bindings.remove(&connection_id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ito_protocol::{PlayerId, RoomCode};

    use super::*;

    fn binding(conn: u64, player: &str, room: &str) -> ConnectionBinding {
        ConnectionBinding::new(
            ConnectionId::new(conn),
            PlayerId::new(player),
            RoomCode::parse(room).unwrap(),
            "Ann",
        )
    }

    #[test]
    fn test_bind_then_get() {
        let mut tracker = ConnectionTracker::new();
        assert!(tracker.bind(binding(1, "p1", "AAAAA")).is_none());

        let found = tracker.get(ConnectionId::new(1)).unwrap();
        assert_eq!(found.player_id, PlayerId::new("p1"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_bind_second_room_overwrites_and_returns_previous() {
        let mut tracker = ConnectionTracker::new();
        tracker.bind(binding(1, "p1", "AAAAA"));

        let previous = tracker.bind(binding(1, "p2", "BBBBB")).unwrap();
        assert_eq!(previous.room_code.as_str(), "AAAAA");

        assert_eq!(tracker.len(), 1);
        let current = tracker.get(ConnectionId::new(1)).unwrap();
        assert_eq!(current.room_code.as_str(), "BBBBB");
        assert_eq!(current.player_id, PlayerId::new("p2"));
    }

    #[test]
    fn test_unbind_removes_only_that_connection() {
        let mut tracker = ConnectionTracker::new();
        tracker.bind(binding(1, "p1", "AAAAA"));
        tracker.bind(binding(2, "p2", "AAAAA"));

        let taken = tracker.unbind(ConnectionId::new(1)).unwrap();
        assert_eq!(taken.player_id, PlayerId::new("p1"));
        assert!(tracker.unbind(ConnectionId::new(1)).is_none());
        assert!(tracker.get(ConnectionId::new(1)).is_none());
        assert!(tracker.require(ConnectionId::new(2)).is_ok());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_require_unbound_is_error() {
        let tracker = ConnectionTracker::new();
        assert!(tracker.is_empty());
        assert!(matches!(
            tracker.require(ConnectionId::new(9)),
            Err(SessionError::NotBound(_))
        ));
    }
}
