//! Per-connection handler: event decoding and routing.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's outbound channel. The
//! flow is:
//!   1. Receive a frame → decode `{event, data, ack}`
//!   2. Requests (`createRoom`, `getRoomInfo`, `joinRoom`) → registry → reply
//!   3. Gameplay events → the room's actor, no reply
//!   4. Socket closes → the bound player leaves its room

use std::sync::Arc;

use ito_protocol::{
    ClientEvent, ClientFrame, Codec, Player, Reply, ReplyBody, RoomSnapshot, ServerEvent,
};
use ito_room::{EventSender, RoomError, RoomHandle};
use ito_session::ConnectionBinding;
use ito_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ItoError;

/// Error text for a request whose frame could not be decoded.
const INVALID_MESSAGE: &str = "Invalid message";

/// Drop guard that removes the connection's player from its room when
/// the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async locks.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            disconnect(&state, conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ItoError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_outbound(Arc::clone(&conn), rx, Arc::clone(&state)));
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let result = read_loop(&conn, &state, &tx).await;

    // Room actors may still hold clones of `tx`; stop writing regardless.
    writer.abort();
    result
    // _guard drops here → the player leaves its room.
}

/// Reads and dispatches frames until the peer goes away.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    tx: &EventSender,
) -> Result<(), ItoError> {
    let conn_id = conn.id();
    while let Some(data) = conn.recv().await? {
        let frame = match state.codec.decode_frame(&data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                // A request still gets an answer, even one we can't read.
                if let Some(ack) = state.codec.decode_ack(&data) {
                    let _ = tx.send(ServerEvent::error_reply(Some(ack), INVALID_MESSAGE));
                }
                continue;
            }
        };
        handle_frame(state, conn_id, tx, frame).await;
    }
    tracing::info!(%conn_id, "connection closed cleanly");
    Ok(())
}

/// Encodes outbound events and writes them to the socket, in order.
async fn write_outbound<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Routes one decoded event.
async fn handle_frame<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    tx: &EventSender,
    frame: ClientFrame,
) {
    let ClientFrame { ack, event } = frame;
    let name = event.name();
    tracing::debug!(%conn_id, event = name, ?ack, "event received");

    match event {
        ClientEvent::CreateRoom { player_name } => {
            let result = state.rooms.create_room(&player_name, tx.clone());
            enter_room(state, conn_id, tx, ack, name, result).await;
        }

        ClientEvent::JoinRoom {
            room_code,
            player_name,
        } => {
            let result = state
                .rooms
                .join_room(&room_code, &player_name, tx.clone())
                .await;
            enter_room(state, conn_id, tx, ack, name, result).await;
        }

        ClientEvent::GetRoomInfo { room_code } => match state.rooms.room_info(&room_code).await {
            Ok(room) => reply(tx, ack, ReplyBody::Info { room }),
            Err(e) => reply_error(tx, ack, conn_id, name, &e),
        },

        ClientEvent::UpdatePlayer {
            room_code,
            player_id,
            hint,
            position,
        } => {
            if let Some(room) = find_room(state, conn_id, name, &room_code) {
                note_gone(conn_id, name, room.update_player(player_id, hint, position).await);
            }
        }

        ClientEvent::StartThemeVoting { room_code } => {
            // Host rights come from the connection's binding, not the payload.
            let requester = match state.connections.lock().await.require(conn_id) {
                Ok(binding) => binding.player_id.clone(),
                Err(e) => {
                    tracing::debug!(%conn_id, %room_code, error = %e, "startThemeVoting ignored");
                    return;
                }
            };
            if let Some(room) = find_room(state, conn_id, name, &room_code) {
                note_gone(conn_id, name, room.start_voting(requester).await);
            }
        }

        ClientEvent::VoteTheme {
            room_code,
            player_id,
            theme,
        } => {
            if let Some(room) = find_room(state, conn_id, name, &room_code) {
                let theme = theme.name().to_owned();
                note_gone(conn_id, name, room.vote(player_id, theme).await);
            }
        }

        ClientEvent::FinishGame { room_code } => {
            if let Some(room) = find_room(state, conn_id, name, &room_code) {
                note_gone(conn_id, name, room.finish().await);
            }
        }
    }
}

/// Binds the connection after a successful create/join and replies.
async fn enter_room<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    tx: &EventSender,
    ack: Option<u64>,
    event: &'static str,
    result: Result<(RoomSnapshot, Player), RoomError>,
) {
    match result {
        Ok((room, player)) => {
            let binding = ConnectionBinding::new(
                conn_id,
                player.id.clone(),
                room.code.clone(),
                player.name.clone(),
            );
            state.connections.lock().await.bind(binding);
            tracing::info!(%conn_id, room_code = %room.code, player_id = %player.id, event, "entered room");
            reply(tx, ack, ReplyBody::Joined { room, player });
        }
        Err(e) => reply_error(tx, ack, conn_id, event, &e),
    }
}

/// Removes the connection's player from its room, if it has one.
async fn disconnect<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId) {
    let Some(binding) = state.connections.lock().await.unbind(conn_id) else {
        tracing::debug!(%conn_id, "unbound connection closed");
        return;
    };

    let result = state
        .rooms
        .remove_player(&binding.room_code, binding.player_id.clone())
        .await;

    match result {
        Ok(Some(outcome)) => tracing::info!(
            %conn_id,
            player_id = %binding.player_id,
            room_code = %binding.room_code,
            room_empty = outcome.room_empty,
            "player disconnected"
        ),
        Ok(None) => tracing::debug!(
            %conn_id,
            player_id = %binding.player_id,
            room_code = %binding.room_code,
            "player already gone from room"
        ),
        Err(e) => tracing::debug!(
            %conn_id,
            room_code = %binding.room_code,
            error = %e,
            "room gone before disconnect"
        ),
    }
}

/// Looks up a room for a fire-and-forget event, logging misses.
fn find_room<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    event: &'static str,
    room_code: &str,
) -> Option<RoomHandle> {
    let handle = state.rooms.handle(room_code);
    if handle.is_none() {
        tracing::debug!(%conn_id, event, room_code, "unknown room, ignoring");
    }
    handle
}

/// Logs a command that reached a room whose actor had already stopped.
fn note_gone(conn_id: ConnectionId, event: &'static str, result: Result<(), RoomError>) {
    if let Err(e) = result {
        tracing::debug!(%conn_id, event, error = %e, "room closed before command, ignoring");
    }
}

fn reply_error(
    tx: &EventSender,
    ack: Option<u64>,
    conn_id: ConnectionId,
    event: &'static str,
    error: &RoomError,
) {
    tracing::debug!(%conn_id, event, error = %error, kind = ?error.kind(), "request rejected");
    let _ = tx.send(ServerEvent::error_reply(ack, error.client_message()));
}

fn reply(tx: &EventSender, ack: Option<u64>, body: ReplyBody) {
    let _ = tx.send(ServerEvent::Reply(Reply { ack, body }));
}
