//! # ITO
//!
//! Real-time session server for the cooperative party game ITO.
//!
//! Players gather in a short-coded room, vote on a theme, each receive a
//! secret number, and try to line themselves up by number using hints.
//! This crate wires the layers together: WebSocket transport, the JSON
//! event protocol, connection tracking, and per-room actors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ito::prelude::*;
//!
//! # async fn run() -> Result<(), ItoError> {
//! let server = ItoServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Behaviour notes
//!
//! - Fire-and-forget events that name an unknown room or player, or a
//!   `startThemeVoting` from anyone but the host, do nothing. Each is
//!   logged with `tracing` rather than dropped silently.
//! - `finishGame` only takes effect once numbers have been dealt. Sent
//!   while the room is still in `lobby` or `voting` it is ignored, and no
//!   `gameFinished` broadcast goes out. A repeat on a finished room
//!   re-broadcasts the same results.
//! - A `null` player name or room code is treated as missing, so the reply
//!   is the usual validation or not-found error.
//! - A request that cannot be decoded at all still gets an
//!   `{"error": "Invalid message"}` reply when it carries an `ack`.

mod error;
mod handler;
mod server;

pub use error::ItoError;
pub use server::{DEFAULT_BIND, ItoServer, ItoServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{DEFAULT_BIND, ItoError, ItoServer, ItoServerBuilder};
    pub use ito_protocol::{
        ClientEvent, Player, PlayerId, PlayerResult, Reply, ReplyBody, RoomCode, RoomSnapshot,
        RoomStatus, RoomSummary, ServerEvent, Theme, ThemeChoice,
    };
    pub use ito_room::{
        RandomSource, RoomConfig, RoomError, SeededRandom, ThemeCatalog, ThreadRandom,
    };
}
