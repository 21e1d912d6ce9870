//! Connection-to-player tracking for the ITO session server.
//!
//! A WebSocket connection starts anonymous. Creating or joining a room
//! binds it to the player record the room just made; closing it turns
//! the binding back into a room departure.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (beside)  ← owns the player records themselves
//!     ↕
//! Session Layer (this crate)  ← remembers which connection is which player
//!     ↕
//! Transport / Protocol (below)  ← provide ConnectionId, PlayerId, RoomCode
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::ConnectionTracker;
pub use session::ConnectionBinding;
