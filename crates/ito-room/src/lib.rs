//! Room lifecycle management for the ITO session server.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! player list, theme vote, and secret numbers, and fans events out to
//! its members.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates rooms, looks them up by code, drops empty ones
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`Room`] — the synchronous room aggregate the actor drives
//! - [`ThemeCatalog`] — the themes a vote draws from
//! - [`RandomSource`] — injectable randomness for codes, draws and tie-breaks
//! - [`RoomConfig`] — number range, theme count, capacity

mod actor;
mod config;
mod error;
mod numbers;
mod random;
mod registry;
mod room;
mod themes;
mod votes;

pub use actor::{EventSender, LeaveOutcome, RoomHandle};
pub use config::RoomConfig;
pub use error::{ErrorKind, RoomError};
pub use numbers::draw_unique;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use registry::RoomRegistry;
pub use room::{Departure, Room, validate_player_name};
pub use themes::ThemeCatalog;
pub use votes::VoteState;
