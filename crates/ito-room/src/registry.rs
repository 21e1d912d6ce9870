//! Room registry: creates rooms, looks them up by code, and drops them
//! when their last player leaves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ito_protocol::{Player, PlayerId, RoomCode, RoomSnapshot, RoomSummary};

use crate::actor::{EventSender, LeaveOutcome, RoomContext, RoomHandle, spawn_room};
use crate::random::{RandomSource, alnum_suffix, room_code};
use crate::room::Room;
use crate::themes::ThemeCatalog;
use crate::{RoomConfig, RoomError};

/// Per-process sequence mixed into player ids so two ids minted in the
/// same millisecond still differ.
static NEXT_PLAYER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Length of the random part of a player id.
const PLAYER_SUFFIX_LEN: usize = 6;

/// Tracks every active room by code.
///
/// This is the entry point for room operations from the server. Creating,
/// joining and leaving go through here so the code index never points at
/// a room that has already closed. Gameplay commands only need a cloned
/// [`RoomHandle`] from [`handle`](Self::handle).
///
/// The index sits behind its own short-lived lock: a handle is cloned out
/// and the lock released before any room actor is awaited, so one busy
/// room never holds up work in another.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
    ctx: Arc<RoomContext>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    ///
    /// # Errors
    /// Returns [`RoomError::Config`] if `config` is invalid or the catalog
    /// holds fewer themes than a vote offers.
    pub fn new(
        config: RoomConfig,
        catalog: Arc<ThemeCatalog>,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, RoomError> {
        config.validate()?;
        if catalog.len() < config.theme_options {
            return Err(RoomError::Config(format!(
                "theme catalog has {} themes but {} are offered per vote",
                catalog.len(),
                config.theme_options
            )));
        }
        Ok(Self {
            rooms: Mutex::new(HashMap::new()),
            ctx: Arc::new(RoomContext {
                config,
                catalog,
                rng,
            }),
        })
    }

    pub fn config(&self) -> &RoomConfig {
        &self.ctx.config
    }

    /// Opens a room with the caller as host and returns its first snapshot
    /// together with the host's record.
    ///
    /// # Errors
    /// Returns [`RoomError::Validation`] if `player_name` is blank.
    pub fn create_room(
        &self,
        player_name: &str,
        sender: EventSender,
    ) -> Result<(RoomSnapshot, Player), RoomError> {
        let mut rooms = self.rooms();
        let code = self.unused_code(&rooms);
        let (room, host) = Room::new(code.clone(), self.new_player_id(), player_name)?;
        let snapshot = room.snapshot();

        let handle = spawn_room(room, sender, Arc::clone(&self.ctx));
        rooms.insert(code.clone(), handle);

        tracing::info!(room_code = %code, host_id = %host.id, rooms = rooms.len(), "room created");
        Ok((snapshot, host))
    }

    /// Summary of a room, for the pre-join lookup.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] for an unknown or malformed code.
    pub async fn room_info(&self, raw_code: &str) -> Result<RoomSummary, RoomError> {
        self.require(raw_code)?.summary().await
    }

    /// Adds a player to an existing room.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] for an unknown or malformed code
    /// - [`RoomError::Validation`] for a blank name
    /// - [`RoomError::NameTaken`] or [`RoomError::RoomFull`] on conflict
    pub async fn join_room(
        &self,
        raw_code: &str,
        player_name: &str,
        sender: EventSender,
    ) -> Result<(RoomSnapshot, Player), RoomError> {
        let handle = self.require(raw_code)?;
        let player_id = self.new_player_id();
        let result = handle.join(player_id, player_name.to_owned(), sender).await;
        if matches!(result, Err(RoomError::Unavailable(_))) {
            self.forget(&handle);
        }
        result
    }

    /// Removes a player from a room, deleting the room if it empties.
    ///
    /// Returns `Ok(None)` if the room exists but the player wasn't in it.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if the room is gone.
    pub async fn remove_player(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
    ) -> Result<Option<LeaveOutcome>, RoomError> {
        let handle = self
            .rooms()
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.to_string()))?;

        match handle.leave(player_id).await {
            Ok(Some(outcome)) => {
                if outcome.room_empty {
                    self.forget(&handle);
                }
                Ok(Some(outcome))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.forget(&handle);
                Err(e)
            }
        }
    }

    /// Clones the handle of a live room. Malformed codes resolve to `None`.
    pub fn handle(&self, raw_code: &str) -> Option<RoomHandle> {
        let code = RoomCode::parse(raw_code).ok()?;
        self.rooms().get(&code).cloned()
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms().contains_key(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Stops every room actor and clears the index.
    pub async fn shutdown_all(&self) {
        let drained: Vec<_> = self.rooms().drain().collect();
        for (code, handle) in drained {
            if handle.shutdown().await.is_err() {
                tracing::debug!(room_code = %code, "room already stopped");
            }
        }
    }

    /// Never held across an `.await`.
    fn rooms(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomHandle>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require(&self, raw_code: &str) -> Result<RoomHandle, RoomError> {
        self.handle(raw_code)
            .ok_or_else(|| RoomError::NotFound(raw_code.to_owned()))
    }

    /// Drops the index entry for `handle`'s room, unless the code has since
    /// been taken by a different room.
    fn forget(&self, handle: &RoomHandle) {
        let mut rooms = self.rooms();
        let code = handle.code();
        if rooms.get(code).is_some_and(|current| current.same_room(handle)) {
            rooms.remove(code);
            tracing::info!(room_code = %code, rooms = rooms.len(), "room removed from registry");
        }
    }

    /// Draws codes until one is free. The code space dwarfs any realistic
    /// number of live rooms, so this settles in a draw or two.
    fn unused_code(&self, rooms: &HashMap<RoomCode, RoomHandle>) -> RoomCode {
        loop {
            let code = room_code(self.ctx.rng.as_ref());
            if !rooms.contains_key(&code) {
                return code;
            }
            tracing::debug!(room_code = %code, "room code collision, redrawing");
        }
    }

    fn new_player_id(&self) -> PlayerId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = NEXT_PLAYER_SEQ.fetch_add(1, Ordering::Relaxed);
        let suffix = alnum_suffix(self.ctx.rng.as_ref(), PLAYER_SUFFIX_LEN);
        PlayerId::new(format!("player_{millis}_{suffix}{seq}"))
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::random::SeededRandom;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(
            RoomConfig::default(),
            Arc::new(ThemeCatalog::builtin()),
            Arc::new(SeededRandom::new(1)),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_catalog_smaller_than_vote() {
        let config = RoomConfig {
            theme_options: 99,
            ..RoomConfig::default()
        };
        let result = RoomRegistry::new(
            config,
            Arc::new(ThemeCatalog::builtin()),
            Arc::new(SeededRandom::new(1)),
        );
        assert!(matches!(result, Err(RoomError::Config(_))));
    }

    #[test]
    fn test_player_ids_are_unique_and_prefixed() {
        let registry = registry();
        let a = registry.new_player_id();
        let b = registry.new_player_id();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("player_"));
    }

    #[tokio::test]
    async fn test_create_room_blank_name_creates_nothing() {
        let registry = registry();
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = registry.create_room("   ", tx);
        assert!(matches!(result, Err(RoomError::Validation(_))));
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_accepts_lowercase_code() {
        let registry = registry();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (snapshot, _) = registry.create_room("Ann", tx).unwrap();
        let lower = snapshot.code.as_str().to_lowercase();
        assert!(registry.handle(&format!(" {lower} ")).is_some());
        assert!(registry.handle("not-a-code").is_none());
    }
}
