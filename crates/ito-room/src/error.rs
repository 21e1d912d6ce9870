//! Error types for the room layer.

use ito_protocol::RoomCode;

/// Errors that can occur during room operations.
///
/// Request/response callers only ever see three classes of failure
/// (see [`RoomError::kind`]); the variants carry enough detail for logs.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A required field was missing or blank.
    #[error("{0}")]
    Validation(String),

    /// No active room has this code. Holds the code as the client sent it,
    /// which may not even be well formed.
    #[error("room {0} not found")]
    NotFound(String),

    /// Another member of the room already uses this name
    /// (compared case-insensitively).
    #[error("name {name:?} is already taken in room {code}")]
    NameTaken { name: String, code: RoomCode },

    /// Every player needs a distinct secret number, so a room can hold no
    /// more players than the number range has values.
    #[error("room {code} is full ({capacity} players)")]
    RoomFull { code: RoomCode, capacity: usize },

    /// More players than distinct numbers in the configured range.
    #[error("cannot draw {players} distinct numbers from a range of {range}")]
    NumberRangeExhausted { players: usize, range: usize },

    /// Room settings are unusable.
    #[error("invalid room config: {0}")]
    Config(String),

    /// The theme catalog could not be loaded.
    #[error("invalid theme catalog: {0}")]
    Catalog(String),

    /// The room's actor has stopped (its last player left).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

/// The error classes a client can observe in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl RoomError {
    /// Classifies the error for the reply channel.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::Unavailable(_) => ErrorKind::NotFound,
            Self::NameTaken { .. } | Self::RoomFull { .. } => ErrorKind::Conflict,
            Self::NumberRangeExhausted { .. } | Self::Config(_) | Self::Catalog(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// A short message suitable for sending to the client.
    pub fn client_message(&self) -> String {
        match self {
            Self::NotFound(_) | Self::Unavailable(_) => "Room not found".into(),
            Self::NameTaken { .. } => "Name already taken in this room".into(),
            Self::RoomFull { .. } => "Room is full".into(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_to_client_classes() {
        let code = RoomCode::parse("AB12C").unwrap();
        assert_eq!(
            RoomError::Validation("Player name is required".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(RoomError::NotFound("ZZZZZ".into()).kind(), ErrorKind::NotFound);
        assert_eq!(RoomError::Unavailable(code.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(
            RoomError::NameTaken {
                name: "ann".into(),
                code: code.clone()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            RoomError::RoomFull { code, capacity: 2 }.kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_client_message_hides_internal_detail() {
        let code = RoomCode::parse("AB12C").unwrap();
        assert_eq!(
            RoomError::Unavailable(code.clone()).client_message(),
            "Room not found"
        );
        assert_eq!(
            RoomError::NameTaken {
                name: "ann".into(),
                code
            }
            .client_message(),
            "Name already taken in this room"
        );
        assert_eq!(
            RoomError::Validation("Player name is required".into()).client_message(),
            "Player name is required"
        );
    }
}
