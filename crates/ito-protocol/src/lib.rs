//! Wire protocol for the ITO session server.
//!
//! This crate defines the event contract that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomSnapshot`],
//!   [`Player`], [`Theme`], ...) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (ClientEvent / ServerEvent) → Rooms + connection tracker
//! ```
//!
//! The protocol layer knows nothing about sockets or room state.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ClientFrame, Player, PlayerId, PlayerResult, ROOM_CODE_ALPHABET,
    ROOM_CODE_LEN, Reply, ReplyBody, RoomCode, RoomSnapshot, RoomStatus, RoomSummary,
    ServerEvent, Theme, ThemeChoice,
};
