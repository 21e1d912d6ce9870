//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Every operation on a room is a [`RoomCommand`] processed to completion
//! before the next one is read, so a vote and its resolution, a departure
//! and its host migration, or a join and its name check can never
//! interleave. Rooms don't share state, so they never wait on each other.
//!
//! The actor also does the fan-out: it holds each member's outbound
//! channel and pushes [`ServerEvent`]s into them without waiting.

use std::collections::HashMap;
use std::sync::Arc;

use ito_protocol::{Player, PlayerId, RoomCode, RoomSnapshot, RoomSummary, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::random::RandomSource;
use crate::room::{Departure, Room};
use crate::themes::ThemeCatalog;
use crate::{RoomConfig, RoomError};

/// Channel a connection reads its outbound events from.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Read-only dependencies shared by every room actor.
pub(crate) struct RoomContext {
    pub(crate) config: RoomConfig,
    pub(crate) catalog: Arc<ThemeCatalog>,
    pub(crate) rng: Arc<dyn RandomSource>,
}

/// Result of a successful leave.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub departure: Departure,
    /// `true` when the leaver was the last player. The actor has stopped
    /// and the room must be dropped from the registry.
    pub room_empty: bool,
}

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/response; the rest
/// are fire-and-forget.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(RoomSnapshot, Player), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Option<LeaveOutcome>>,
    },
    UpdatePlayer {
        player_id: PlayerId,
        hint: Option<String>,
        position: Option<i32>,
    },
    StartVoting {
        requester: PlayerId,
    },
    Vote {
        player_id: PlayerId,
        theme: String,
    },
    Finish,
    GetSummary {
        reply: oneshot::Sender<RoomSummary>,
    },
    GetSnapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Shutdown,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone — it's just an `mpsc::Sender` wrapper. Callers clone it
/// out of the registry so they don't hold the registry lock while the
/// room works.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether both handles feed the same actor.
    pub(crate) fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Adds a player. See [`Room::join`] for the rules.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<(RoomSnapshot, Player), RoomError> {
        self.request(|reply| RoomCommand::Join {
            player_id,
            name,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a player. `Ok(None)` if they weren't a member.
    pub async fn leave(&self, player_id: PlayerId) -> Result<Option<LeaveOutcome>, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await
    }

    pub async fn update_player(
        &self,
        player_id: PlayerId,
        hint: Option<String>,
        position: Option<i32>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::UpdatePlayer {
            player_id,
            hint,
            position,
        })
        .await
    }

    pub async fn start_voting(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::StartVoting { requester }).await
    }

    pub async fn vote(&self, player_id: PlayerId, theme: String) -> Result<(), RoomError> {
        self.send(RoomCommand::Vote { player_id, theme }).await
    }

    pub async fn finish(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Finish).await
    }

    pub async fn summary(&self) -> Result<RoomSummary, RoomError> {
        self.request(|reply| RoomCommand::GetSummary { reply }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::GetSnapshot { reply }).await
    }

    /// Tells the room to stop. Members are not notified.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Outbound channel per member.
    senders: HashMap<PlayerId, EventSender>,
    ctx: Arc<RoomContext>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until shutdown or the last player leaves.
    async fn run(mut self) {
        let code = self.room.code().clone();
        tracing::info!(room_code = %code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    name,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(player_id, &name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let outcome = self.handle_leave(&player_id);
                    let empty = outcome.as_ref().is_some_and(|o| o.room_empty);
                    let _ = reply.send(outcome);
                    if empty {
                        tracing::info!(room_code = %code, "room deleted (no players)");
                        break;
                    }
                }
                RoomCommand::UpdatePlayer {
                    player_id,
                    hint,
                    position,
                } => self.handle_update(player_id, hint, position),
                RoomCommand::StartVoting { requester } => self.handle_start_voting(&requester),
                RoomCommand::Vote { player_id, theme } => self.handle_vote(&player_id, &theme),
                RoomCommand::Finish => self.handle_finish(),
                RoomCommand::GetSummary { reply } => {
                    let _ = reply.send(self.room.summary());
                }
                RoomCommand::GetSnapshot { reply } => {
                    let _ = reply.send(self.room.snapshot());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_code = %code, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_code = %code, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        sender: EventSender,
    ) -> Result<(RoomSnapshot, Player), RoomError> {
        let player = self
            .room
            .join(player_id, name, self.ctx.config.capacity())?;
        self.senders.insert(player.id.clone(), sender);

        tracing::info!(
            room_code = %self.room.code(),
            player_id = %player.id,
            players = self.room.players().len(),
            "player joined"
        );

        self.broadcast(ServerEvent::PlayerJoined(self.room.players().to_vec()));
        Ok((self.room.snapshot(), player))
    }

    fn handle_leave(&mut self, player_id: &PlayerId) -> Option<LeaveOutcome> {
        let Some(departure) = self.room.remove_player(player_id) else {
            tracing::debug!(
                room_code = %self.room.code(),
                %player_id,
                "leave for non-member, ignoring"
            );
            return None;
        };
        self.senders.remove(player_id);

        tracing::info!(
            room_code = %self.room.code(),
            %player_id,
            players = self.room.players().len(),
            "player left"
        );

        if let Some(host_id) = &departure.new_host {
            tracing::info!(room_code = %self.room.code(), %host_id, "host migrated");
            self.broadcast(ServerEvent::NewHost {
                host_id: host_id.clone(),
            });
        }

        self.broadcast(ServerEvent::PlayerLeft {
            player_id: departure.player.id.clone(),
            player_name: departure.player.name.clone(),
            players: self.room.players().to_vec(),
        });

        let room_empty = self.room.is_empty();
        if !room_empty {
            if departure.vote_withdrawn {
                if let Some(votes) = self.room.votes() {
                    self.broadcast(ServerEvent::ThemeVoted(votes.voter_count()));
                }
            }
            // The leaver may have been the last one the vote waited for.
            self.resolve_if_complete();
        }

        Some(LeaveOutcome {
            departure,
            room_empty,
        })
    }

    fn handle_update(&mut self, player_id: PlayerId, hint: Option<String>, position: Option<i32>) {
        if !self
            .room
            .update_player(&player_id, hint.clone(), position)
        {
            tracing::debug!(
                room_code = %self.room.code(),
                %player_id,
                "update for non-member, ignoring"
            );
            return;
        }
        self.broadcast(ServerEvent::PlayerUpdated {
            player_id,
            hint,
            position,
        });
    }

    fn handle_start_voting(&mut self, requester: &PlayerId) {
        let ctx = Arc::clone(&self.ctx);
        match self.room.start_voting(
            requester,
            &ctx.catalog,
            ctx.config.theme_options,
            ctx.rng.as_ref(),
        ) {
            Some(themes) => {
                tracing::info!(room_code = %self.room.code(), "theme voting started");
                self.broadcast(ServerEvent::ThemeVotingStarted { themes });
            }
            None => tracing::debug!(
                room_code = %self.room.code(),
                %requester,
                status = %self.room.status(),
                "start voting ignored (not host or vote closed)"
            ),
        }
    }

    fn handle_vote(&mut self, player_id: &PlayerId, theme: &str) {
        let ctx = Arc::clone(&self.ctx);
        match self.room.cast_vote(player_id, theme, &ctx.catalog) {
            Some(count) => {
                tracing::debug!(room_code = %self.room.code(), %player_id, theme, count, "vote cast");
                self.broadcast(ServerEvent::ThemeVoted(count));
                self.resolve_if_complete();
            }
            None => tracing::warn!(
                room_code = %self.room.code(),
                %player_id,
                theme,
                status = %self.room.status(),
                "vote ignored"
            ),
        }
    }

    /// Selects the theme and deals numbers once everyone has voted.
    fn resolve_if_complete(&mut self) {
        let ctx = Arc::clone(&self.ctx);
        let Some(theme) = self.room.maybe_resolve(&ctx.catalog, ctx.rng.as_ref()) else {
            return;
        };
        tracing::info!(room_code = %self.room.code(), theme = %theme.name, "theme selected");
        self.broadcast(ServerEvent::ThemeSelected { theme });

        match self.room.assign_numbers(
            ctx.config.number_min,
            ctx.config.number_max,
            ctx.rng.as_ref(),
        ) {
            Ok(assigned) => {
                for (player_id, number) in assigned {
                    self.whisper(
                        &player_id,
                        ServerEvent::AssignedNumber {
                            number,
                            player_id: player_id.clone(),
                        },
                    );
                }
            }
            Err(e) => tracing::error!(
                room_code = %self.room.code(),
                error = %e,
                "number assignment failed"
            ),
        }
    }

    fn handle_finish(&mut self) {
        match self.room.finish() {
            Some(results) => {
                tracing::info!(room_code = %self.room.code(), "game finished");
                self.broadcast(ServerEvent::GameFinished(results));
            }
            None => tracing::debug!(
                room_code = %self.room.code(),
                status = %self.room.status(),
                "finish ignored (game not started)"
            ),
        }
    }

    /// Sends an event to every member.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Sends an event to one member. Silently drops if the receiver is
    /// gone.
    fn whisper(&self, player_id: &PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(player_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a room actor for an already created room whose only member is
/// its host, and returns a handle to it.
pub(crate) fn spawn_room(room: Room, host_sender: EventSender, ctx: Arc<RoomContext>) -> RoomHandle {
    let (tx, rx) = mpsc::channel(ctx.config.channel_size);
    let code = room.code().clone();

    let mut senders = HashMap::new();
    senders.insert(room.host_id().clone(), host_sender);

    let actor = RoomActor {
        room,
        senders,
        ctx,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
