//! The room aggregate: players, host, status, theme vote, and numbers.
//!
//! `Room` is plain synchronous state. It never touches channels or tasks;
//! the actor in [`crate::actor`] owns one and turns the outcomes of these
//! methods into broadcasts. That keeps every rule here testable without a
//! runtime.

use ito_protocol::{
    Player, PlayerId, PlayerResult, RoomCode, RoomSnapshot, RoomStatus, RoomSummary, Theme,
};

use crate::numbers::draw_unique;
use crate::random::RandomSource;
use crate::themes::ThemeCatalog;
use crate::votes::VoteState;
use crate::RoomError;

/// Trims a submitted player name and rejects blank ones.
///
/// # Errors
/// Returns [`RoomError::Validation`] for an empty or whitespace-only name.
pub fn validate_player_name(raw: &str) -> Result<String, RoomError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RoomError::Validation("Player name is required".into()));
    }
    Ok(name.to_owned())
}

/// What changed when a player left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The removed player record.
    pub player: Player,
    /// Set when the leaver was host and someone was left to promote.
    pub new_host: Option<PlayerId>,
    /// `true` if the leaver had a vote that was withdrawn.
    pub vote_withdrawn: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    status: RoomStatus,
    /// Join order. Host promotion picks the front.
    players: Vec<Player>,
    host_id: PlayerId,
    theme_options: Vec<Theme>,
    selected_theme: Option<Theme>,
    /// Present from the first vote (or voting start) until a theme wins.
    votes: Option<VoteState>,
}

impl Room {
    /// Opens a room in the lobby with `host` as its only, hosting, member.
    pub fn new(code: RoomCode, host_id: PlayerId, host_name: &str) -> Result<(Self, Player), RoomError> {
        let name = validate_player_name(host_name)?;
        let host = Player::new(host_id.clone(), name, true);
        let room = Self {
            code,
            status: RoomStatus::Lobby,
            players: vec![host.clone()],
            host_id,
            theme_options: Vec::new(),
            selected_theme: None,
            votes: None,
        };
        Ok((room, host))
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn host_id(&self) -> &PlayerId {
        &self.host_id
    }

    pub fn selected_theme(&self) -> Option<&Theme> {
        self.selected_theme.as_ref()
    }

    pub fn theme_options(&self) -> &[Theme] {
        &self.theme_options
    }

    pub fn votes(&self) -> Option<&VoteState> {
        self.votes.as_ref()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Case-insensitive name check.
    pub fn has_name(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.players.iter().any(|p| p.name.to_lowercase() == wanted)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            status: self.status,
            players: self.players.clone(),
            host_id: self.host_id.clone(),
            theme_options: self.theme_options.clone(),
            selected_theme: self.selected_theme.clone(),
        }
    }

    /// Code, status, and head count only; no player identities.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            status: self.status,
            player_count: self.players.len(),
        }
    }

    // -- Membership ------------------------------------------------------

    /// Appends a non-host player.
    ///
    /// Joining is allowed in every status, including mid-vote and mid-game.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] — blank name
    /// - [`RoomError::NameTaken`] — name already used here, ignoring case
    /// - [`RoomError::RoomFull`] — `capacity` players already present
    pub fn join(&mut self, id: PlayerId, raw_name: &str, capacity: usize) -> Result<Player, RoomError> {
        let name = validate_player_name(raw_name)?;
        if self.has_name(&name) {
            return Err(RoomError::NameTaken {
                name,
                code: self.code.clone(),
            });
        }
        if self.players.len() >= capacity {
            return Err(RoomError::RoomFull {
                code: self.code.clone(),
                capacity,
            });
        }
        let player = Player::new(id, name, false);
        self.players.push(player.clone());
        Ok(player)
    }

    /// Removes a player, withdrawing their vote and promoting a new host
    /// if they held it. Returns `None` if they weren't a member.
    ///
    /// When the last player leaves the room is left empty with a stale
    /// `host_id`; the owner deletes it straight away.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Departure> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        let player = self.players.remove(index);

        let vote_withdrawn = self
            .votes
            .as_mut()
            .is_some_and(|votes| votes.retract(id).is_some());

        let mut new_host = None;
        if self.host_id == player.id {
            if let Some(first) = self.players.first_mut() {
                first.is_host = true;
                self.host_id = first.id.clone();
                new_host = Some(first.id.clone());
            }
        }

        Some(Departure {
            player,
            new_host,
            vote_withdrawn,
        })
    }

    /// Overwrites a player's hint and position. Accepted in any status.
    ///
    /// Returns `false` if the player isn't a member.
    pub fn update_player(&mut self, id: &PlayerId, hint: Option<String>, position: Option<i32>) -> bool {
        match self.players.iter_mut().find(|p| &p.id == id) {
            Some(player) => {
                player.hint = hint;
                player.position = position;
                true
            }
            None => false,
        }
    }

    // -- Theme vote ------------------------------------------------------

    /// Opens (or reopens) the vote with `count` freshly drawn themes.
    ///
    /// Returns `None` without changing anything unless `requester` is the
    /// host and the room is still in the lobby or voting.
    pub fn start_voting(
        &mut self,
        requester: &PlayerId,
        catalog: &ThemeCatalog,
        count: usize,
        rng: &dyn RandomSource,
    ) -> Option<Vec<Theme>> {
        if requester != &self.host_id || !self.status.can_transition_to(RoomStatus::Voting) {
            return None;
        }
        let themes = catalog.draw(count, rng);
        self.theme_options = themes.clone();
        self.status = RoomStatus::Voting;
        self.votes = Some(VoteState::new());
        Some(themes)
    }

    /// Records a member's vote. Returns the number of distinct voters.
    ///
    /// Returns `None` (ignored) once a theme has been selected, for
    /// non-members, and for names missing from the catalog. In the lobby
    /// the vote state is created on demand.
    pub fn cast_vote(&mut self, player: &PlayerId, theme: &str, catalog: &ThemeCatalog) -> Option<usize> {
        if !self.status.accepts_votes() || self.player(player).is_none() || catalog.get(theme).is_none() {
            return None;
        }
        let votes = self.votes.get_or_insert_with(VoteState::new);
        Some(votes.cast(player.clone(), theme))
    }

    /// Selects the winning theme once every current player has voted.
    ///
    /// On success the room moves to `playing`, the vote state is retired,
    /// and the winner is returned.
    pub fn maybe_resolve(&mut self, catalog: &ThemeCatalog, rng: &dyn RandomSource) -> Option<Theme> {
        if !self.status.accepts_votes() {
            return None;
        }
        let winner = self.votes.as_ref()?.winner(self.players.len(), rng)?;
        let theme = catalog.get(&winner)?.clone();

        self.selected_theme = Some(theme.clone());
        self.status = RoomStatus::Playing;
        self.votes = None;
        Some(theme)
    }

    /// Gives every player a distinct secret number from `min..=max`, in
    /// room order. Returns the `(player, number)` pairs to whisper.
    ///
    /// # Errors
    /// Returns [`RoomError::NumberRangeExhausted`] (and assigns nothing)
    /// when there are more players than numbers.
    pub fn assign_numbers(
        &mut self,
        min: u32,
        max: u32,
        rng: &dyn RandomSource,
    ) -> Result<Vec<(PlayerId, u32)>, RoomError> {
        let numbers = draw_unique(self.players.len(), min, max, rng)?;
        Ok(self
            .players
            .iter_mut()
            .zip(numbers)
            .map(|(player, n)| {
                player.number = Some(n);
                (player.id.clone(), n)
            })
            .collect())
    }

    // -- Finish ----------------------------------------------------------

    /// Ends the round and returns results in room order.
    ///
    /// Only a room that is playing (or already finished) can finish;
    /// otherwise returns `None`. `correct` is always `true` for now.
    pub fn finish(&mut self) -> Option<Vec<PlayerResult>> {
        if !self.status.can_transition_to(RoomStatus::Finished) {
            return None;
        }
        self.status = RoomStatus::Finished;
        Some(
            self.players
                .iter()
                .map(|p| PlayerResult {
                    player_id: p.id.clone(),
                    player_name: p.name.clone(),
                    number: p.number,
                    position: p.position,
                    hint: p.hint.clone(),
                    correct: true,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::random::SeededRandom;

    fn pid(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    fn code() -> RoomCode {
        RoomCode::parse("AB12C").unwrap()
    }

    /// A lobby room with host "p1"/"Ann" plus the given extra players.
    fn room_with(extra: &[(&str, &str)]) -> Room {
        let (mut room, _) = Room::new(code(), pid("p1"), "Ann").unwrap();
        for (id, name) in extra {
            room.join(pid(id), name, 100).unwrap();
        }
        room
    }

    fn assert_single_host(room: &Room) {
        let hosts: Vec<_> = room.players().iter().filter(|p| p.is_host).collect();
        assert_eq!(hosts.len(), 1, "exactly one host expected");
        assert_eq!(&hosts[0].id, room.host_id());
    }

    #[test]
    fn test_new_creator_is_host_in_lobby() {
        let (room, host) = Room::new(code(), pid("p1"), "  Ann ").unwrap();
        assert!(host.is_host);
        assert_eq!(host.name, "Ann");
        assert_eq!(room.host_id(), &host.id);
        assert_eq!(room.status(), RoomStatus::Lobby);
        assert_single_host(&room);
    }

    #[test]
    fn test_new_blank_name_is_validation_error() {
        assert!(matches!(
            Room::new(code(), pid("p1"), "   "),
            Err(RoomError::Validation(_))
        ));
    }

    #[test]
    fn test_join_duplicate_name_ignoring_case_is_conflict() {
        let mut room = room_with(&[]);
        let result = room.join(pid("p2"), "ann", 100);
        assert!(matches!(result, Err(RoomError::NameTaken { .. })));
        assert_eq!(room.players().len(), 1);
    }

    #[test]
    fn test_join_appends_non_host_in_order() {
        let room = room_with(&[("p2", "Bea"), ("p3", "Cal")]);
        let names: Vec<_> = room.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bea", "Cal"]);
        assert!(!room.players()[1].is_host);
        assert_single_host(&room);
    }

    #[test]
    fn test_join_full_room_is_rejected() {
        let mut room = room_with(&[("p2", "Bea")]);
        assert!(matches!(
            room.join(pid("p3"), "Cal", 2),
            Err(RoomError::RoomFull { capacity: 2, .. })
        ));
    }

    #[test]
    fn test_join_allowed_mid_game() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(1);
        let mut room = room_with(&[]);
        room.start_voting(&pid("p1"), &catalog, 5, &rng).unwrap();
        assert!(room.join(pid("p2"), "Bea", 100).is_ok());
    }

    #[test]
    fn test_remove_host_promotes_first_remaining() {
        let mut room = room_with(&[("p2", "Bea"), ("p3", "Cal")]);
        let departure = room.remove_player(&pid("p1")).unwrap();

        assert_eq!(departure.player.name, "Ann");
        assert_eq!(departure.new_host, Some(pid("p2")));
        assert_eq!(room.host_id(), &pid("p2"));
        assert_single_host(&room);
    }

    #[test]
    fn test_remove_non_host_keeps_host() {
        let mut room = room_with(&[("p2", "Bea")]);
        let departure = room.remove_player(&pid("p2")).unwrap();
        assert_eq!(departure.new_host, None);
        assert_eq!(room.host_id(), &pid("p1"));
        assert_single_host(&room);
    }

    #[test]
    fn test_remove_last_player_leaves_room_empty() {
        let mut room = room_with(&[]);
        let departure = room.remove_player(&pid("p1")).unwrap();
        assert_eq!(departure.new_host, None);
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_unknown_player_is_none() {
        let mut room = room_with(&[]);
        assert!(room.remove_player(&pid("ghost")).is_none());
    }

    #[test]
    fn test_start_voting_non_host_is_ignored() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(1);
        let mut room = room_with(&[("p2", "Bea")]);

        assert!(room.start_voting(&pid("p2"), &catalog, 5, &rng).is_none());
        assert_eq!(room.status(), RoomStatus::Lobby);
        assert!(room.votes().is_none());
    }

    #[test]
    fn test_start_voting_draws_distinct_options() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(1);
        let mut room = room_with(&[]);

        let themes = room.start_voting(&pid("p1"), &catalog, 5, &rng).unwrap();
        let names: HashSet<_> = themes.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names.len(), 5);
        assert_eq!(room.status(), RoomStatus::Voting);
        assert_eq!(room.theme_options(), themes.as_slice());
        assert_eq!(room.votes().unwrap().voter_count(), 0);
    }

    #[test]
    fn test_cast_vote_in_lobby_creates_vote_state() {
        let catalog = ThemeCatalog::builtin();
        let mut room = room_with(&[("p2", "Bea")]);
        assert_eq!(room.cast_vote(&pid("p2"), "Smells", &catalog), Some(1));
        assert!(room.votes().unwrap().is_consistent());
    }

    #[test]
    fn test_cast_vote_ignores_non_member_and_unknown_theme() {
        let catalog = ThemeCatalog::builtin();
        let mut room = room_with(&[]);
        assert_eq!(room.cast_vote(&pid("ghost"), "Smells", &catalog), None);
        assert_eq!(room.cast_vote(&pid("p1"), "No such theme", &catalog), None);
        assert!(room.votes().is_none());
    }

    #[test]
    fn test_maybe_resolve_majority_selects_theme_and_plays() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(3);
        let mut room = room_with(&[("p2", "Bea"), ("p3", "Cal")]);
        room.start_voting(&pid("p1"), &catalog, 5, &rng).unwrap();

        room.cast_vote(&pid("p1"), "Smells", &catalog);
        assert!(room.maybe_resolve(&catalog, &rng).is_none());
        room.cast_vote(&pid("p2"), "Smells", &catalog);
        assert!(room.maybe_resolve(&catalog, &rng).is_none());
        room.cast_vote(&pid("p3"), "Sports", &catalog);

        let theme = room.maybe_resolve(&catalog, &rng).expect("all voted");
        assert_eq!(theme.name, "Smells");
        assert_eq!(room.status(), RoomStatus::Playing);
        assert_eq!(room.selected_theme(), Some(&theme));
        assert!(room.votes().is_none(), "vote state retired");
    }

    #[test]
    fn test_votes_after_resolution_are_ignored() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(3);
        let mut room = room_with(&[]);
        room.cast_vote(&pid("p1"), "Smells", &catalog);
        room.maybe_resolve(&catalog, &rng).unwrap();

        assert_eq!(room.cast_vote(&pid("p1"), "Sports", &catalog), None);
        assert!(room.maybe_resolve(&catalog, &rng).is_none());
        assert_eq!(room.selected_theme().unwrap().name, "Smells");
    }

    #[test]
    fn test_start_voting_after_playing_is_ignored() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(3);
        let mut room = room_with(&[]);
        room.cast_vote(&pid("p1"), "Smells", &catalog);
        room.maybe_resolve(&catalog, &rng).unwrap();

        assert!(room.start_voting(&pid("p1"), &catalog, 5, &rng).is_none());
        assert_eq!(room.status(), RoomStatus::Playing);
    }

    #[test]
    fn test_departure_withdraws_vote_and_can_complete_vote() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(3);
        let mut room = room_with(&[("p2", "Bea"), ("p3", "Cal")]);
        room.start_voting(&pid("p1"), &catalog, 5, &rng).unwrap();
        room.cast_vote(&pid("p1"), "Smells", &catalog);
        room.cast_vote(&pid("p3"), "Smells", &catalog);

        // p2 never voted; once they leave everyone remaining has.
        let departure = room.remove_player(&pid("p2")).unwrap();
        assert!(!departure.vote_withdrawn);
        assert_eq!(room.maybe_resolve(&catalog, &rng).unwrap().name, "Smells");
    }

    #[test]
    fn test_departure_of_voter_withdraws_vote() {
        let catalog = ThemeCatalog::builtin();
        let mut room = room_with(&[("p2", "Bea")]);
        room.cast_vote(&pid("p2"), "Smells", &catalog);
        let departure = room.remove_player(&pid("p2")).unwrap();
        assert!(departure.vote_withdrawn);
        assert_eq!(room.votes().unwrap().voter_count(), 0);
        assert!(room.votes().unwrap().is_consistent());
    }

    #[test]
    fn test_assign_numbers_distinct_in_range_in_room_order() {
        let rng = SeededRandom::new(11);
        let mut room = room_with(&[("p2", "Bea"), ("p3", "Cal")]);
        let assigned = room.assign_numbers(1, 100, &rng).unwrap();

        let ids: Vec<_> = assigned.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![pid("p1"), pid("p2"), pid("p3")]);
        let set: HashSet<_> = assigned.iter().map(|(_, n)| *n).collect();
        assert_eq!(set.len(), 3);
        for (player, (_, n)) in room.players().iter().zip(&assigned) {
            assert_eq!(player.number, Some(*n));
            assert!((1..=100).contains(n));
        }
    }

    #[test]
    fn test_assign_numbers_too_many_players_assigns_nothing() {
        let rng = SeededRandom::new(11);
        let mut room = room_with(&[("p2", "Bea"), ("p3", "Cal")]);
        assert!(matches!(
            room.assign_numbers(1, 2, &rng),
            Err(RoomError::NumberRangeExhausted { .. })
        ));
        assert!(room.players().iter().all(|p| p.number.is_none()));
    }

    #[test]
    fn test_update_player_sets_hint_and_position() {
        let mut room = room_with(&[]);
        assert!(room.update_player(&pid("p1"), Some("tiny".into()), Some(1)));
        let p = room.player(&pid("p1")).unwrap();
        assert_eq!(p.hint.as_deref(), Some("tiny"));
        assert_eq!(p.position, Some(1));
        assert!(!room.update_player(&pid("ghost"), None, None));
    }

    #[test]
    fn test_finish_lists_results_in_room_order() {
        let catalog = ThemeCatalog::builtin();
        let rng = SeededRandom::new(3);
        let mut room = room_with(&[("p2", "Bea")]);
        room.cast_vote(&pid("p1"), "Smells", &catalog);
        room.cast_vote(&pid("p2"), "Smells", &catalog);
        room.maybe_resolve(&catalog, &rng).unwrap();
        room.assign_numbers(1, 100, &rng).unwrap();
        room.update_player(&pid("p1"), Some("h1".into()), Some(1));
        room.update_player(&pid("p2"), Some("h2".into()), Some(2));

        let results = room.finish().expect("playing room can finish");
        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].player_name, "Ann");
        assert_eq!(results[0].hint.as_deref(), Some("h1"));
        assert_eq!(results[0].position, Some(1));
        assert_eq!(results[0].number, room.players()[0].number);
        assert_eq!(results[1].player_id, pid("p2"));
        assert!(results.iter().all(|r| r.correct));
    }

    #[test]
    fn test_finish_in_lobby_is_ignored() {
        let mut room = room_with(&[]);
        assert!(room.finish().is_none());
        assert_eq!(room.status(), RoomStatus::Lobby);
    }
}
