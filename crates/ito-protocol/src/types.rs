//! Core protocol types for the ITO wire format.
//!
//! Everything in this module travels over the socket: identifiers, the
//! player and room snapshots that are broadcast to members, the events a
//! client may send, and the events the server pushes back. Field names are
//! camelCase on the wire because the browser client reads them directly.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A globally unique player identifier, generated at join time.
///
/// Serialized as a plain string (`"player_1718000000000_k3j9x2"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps an already generated id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 5;

/// Characters a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A short, human-shareable room code: five uppercase alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parses a code typed by a player.
    ///
    /// Surrounding whitespace is trimmed and letters are upper-cased, so
    /// `" ab12c"` and `"AB12C"` name the same room.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] when the normalized value is
    /// not exactly [`ROOM_CODE_LEN`] characters from [`ROOM_CODE_ALPHABET`].
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() != ROOM_CODE_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code must be {ROOM_CODE_LEN} characters, got {}",
                normalized.len()
            )));
        }
        if let Some(bad) = normalized
            .bytes()
            .find(|b| !ROOM_CODE_ALPHABET.contains(b))
        {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code contains invalid character {:?}",
                bad as char
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Room status
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle.
///
/// ```text
/// Lobby ──(host starts voting)──→ Voting ──(last vote, winner)──→ Playing ──(finish)──→ Finished
/// ```
///
/// There is no way back: a finished room stays finished until its last
/// player leaves and it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Lobby,
    Voting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` while theme votes are still accepted.
    ///
    /// Lobby counts: a vote that races ahead of `themeVotingStarted`
    /// is kept rather than dropped.
    pub fn accepts_votes(self) -> bool {
        matches!(self, Self::Lobby | Self::Voting)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::Voting)
                | (Self::Voting, Self::Voting)
                | (Self::Lobby | Self::Voting, Self::Playing)
                | (Self::Playing | Self::Finished, Self::Finished)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::Voting => "voting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A named category of gameplay content offered for vote.
///
/// `low` and `high` describe what the smallest (1) and largest number mean
/// under this theme, e.g. "a mouse" and "a blue whale".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub description: String,
    pub low: String,
    pub high: String,
}

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    /// Secret number, set once a theme is selected.
    pub number: Option<u32>,
    pub hint: Option<String>,
    pub position: Option<i32>,
}

impl Player {
    /// A freshly joined player with no number, hint, or position yet.
    pub fn new(id: PlayerId, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_host,
            number: None,
            hint: None,
            position: None,
        }
    }
}

/// The full room as returned to a player who created or joined it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub players: Vec<Player>,
    pub host_id: PlayerId,
    pub theme_options: Vec<Theme>,
    pub selected_theme: Option<Theme>,
}

/// What an unauthenticated visitor may learn about a room before joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub player_count: usize,
}

/// One line of the end-of-game results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub player_id: PlayerId,
    pub player_name: String,
    pub number: Option<u32>,
    pub position: Option<i32>,
    pub hint: Option<String>,
    /// Always `true`: ordering is not scored yet.
    pub correct: bool,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// The theme a player votes for: either a bare name or a theme object
/// (only its `name` is read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeChoice {
    Name(String),
    Theme { name: String },
}

impl ThemeChoice {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Theme { name } => name,
        }
    }
}

/// Every event a client may send.
///
/// Adjacently tagged: `{"event": "joinRoom", "data": {"roomCode": "AB12C", "playerName": "Ann"}}`.
/// Missing or `null` names and codes decode as empty strings so that the
/// room layer, not the decoder, reports them as validation or not-found
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Request: open a new room with the sender as host.
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        #[serde(default, deserialize_with = "null_as_empty")]
        player_name: String,
    },

    /// Request: peek at a room without joining it.
    #[serde(rename_all = "camelCase")]
    GetRoomInfo {
        #[serde(default, deserialize_with = "null_as_empty")]
        room_code: String,
    },

    /// Request: join an existing room.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        #[serde(default, deserialize_with = "null_as_empty")]
        room_code: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        player_name: String,
    },

    /// Set a player's hint and position (both overwritten, `null` clears).
    #[serde(rename_all = "camelCase")]
    UpdatePlayer {
        room_code: String,
        player_id: PlayerId,
        #[serde(default)]
        hint: Option<String>,
        #[serde(default)]
        position: Option<i32>,
    },

    /// Host only: draw theme options and open the vote.
    #[serde(rename_all = "camelCase")]
    StartThemeVoting { room_code: String },

    /// Cast or change a theme vote.
    #[serde(rename_all = "camelCase")]
    VoteTheme {
        room_code: String,
        player_id: PlayerId,
        theme: ThemeChoice,
    },

    /// End the round and publish results.
    #[serde(rename_all = "camelCase")]
    FinishGame { room_code: String },
}

impl ClientEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::GetRoomInfo { .. } => "getRoomInfo",
            Self::JoinRoom { .. } => "joinRoom",
            Self::UpdatePlayer { .. } => "updatePlayer",
            Self::StartThemeVoting { .. } => "startThemeVoting",
            Self::VoteTheme { .. } => "voteTheme",
            Self::FinishGame { .. } => "finishGame",
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A decoded inbound frame: the event plus its optional correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFrame {
    pub ack: Option<u64>,
    pub event: ClientEvent,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// The body of a reply to a request/response event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyBody {
    /// `createRoom` / `joinRoom` succeeded.
    Joined {
        room: RoomSnapshot,
        player: Player,
    },
    /// `getRoomInfo` succeeded.
    Info { room: RoomSummary },
    /// Any request failed; `error` is a human-readable message.
    Error { error: String },
}

/// A reply, echoing the `ack` id the request carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub ack: Option<u64>,
    #[serde(flatten)]
    pub body: ReplyBody,
}

/// Every event the server pushes to a connection.
///
/// Same adjacent tagging as [`ClientEvent`]. All variants except
/// [`Reply`](Self::Reply) and [`AssignedNumber`](Self::AssignedNumber) are
/// room broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Direct answer to a request.
    Reply(Reply),

    /// The full player list after someone joined.
    PlayerJoined(Vec<Player>),

    #[serde(rename_all = "camelCase")]
    PlayerUpdated {
        player_id: PlayerId,
        hint: Option<String>,
        position: Option<i32>,
    },

    ThemeVotingStarted { themes: Vec<Theme> },

    /// Number of distinct players who have voted so far.
    ThemeVoted(usize),

    ThemeSelected { theme: Theme },

    /// Private: sent only to the player it belongs to.
    #[serde(rename_all = "camelCase")]
    AssignedNumber { number: u32, player_id: PlayerId },

    GameFinished(Vec<PlayerResult>),

    #[serde(rename_all = "camelCase")]
    NewHost { host_id: PlayerId },

    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: PlayerId,
        player_name: String,
        players: Vec<Player>,
    },
}

impl ServerEvent {
    /// Builds an error reply.
    pub fn error_reply(ack: Option<u64>, message: impl Into<String>) -> Self {
        Self::Reply(Reply {
            ack,
            body: ReplyBody::Error {
                error: message.into(),
            },
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
