//! Per-room theme vote tally.
//!
//! Two views of the same votes are kept: voters per theme (for counting)
//! and theme per voter (for re-votes and departures). Both are private and
//! only changed together, so `p ∈ by_theme[t]` holds exactly when
//! `by_player[p] == t`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ito_protocol::PlayerId;

use crate::random::RandomSource;

#[derive(Debug, Clone, Default)]
pub struct VoteState {
    by_theme: BTreeMap<String, BTreeSet<PlayerId>>,
    by_player: HashMap<PlayerId, String>,
}

impl VoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `player`'s vote for `theme`, replacing any earlier vote.
    ///
    /// Returns the number of distinct voters afterwards.
    pub fn cast(&mut self, player: PlayerId, theme: &str) -> usize {
        self.retract(&player);
        self.by_theme
            .entry(theme.to_owned())
            .or_default()
            .insert(player.clone());
        self.by_player.insert(player, theme.to_owned());
        self.voter_count()
    }

    /// Removes `player`'s vote, if any. Returns the theme it was for.
    pub fn retract(&mut self, player: &PlayerId) -> Option<String> {
        let previous = self.by_player.remove(player)?;
        if let Some(voters) = self.by_theme.get_mut(&previous) {
            voters.remove(player);
            if voters.is_empty() {
                self.by_theme.remove(&previous);
            }
        }
        Some(previous)
    }

    pub fn voter_count(&self) -> usize {
        self.by_player.len()
    }

    /// Vote counts per theme, in theme-name order.
    pub fn tally(&self) -> Vec<(&str, usize)> {
        self.by_theme
            .iter()
            .map(|(theme, voters)| (theme.as_str(), voters.len()))
            .collect()
    }

    /// All themes tied at the highest vote count.
    pub fn leaders(&self) -> Vec<&str> {
        let tally = self.tally();
        let Some(max) = tally.iter().map(|(_, n)| *n).max() else {
            return Vec::new();
        };
        tally
            .into_iter()
            .filter(|(_, n)| *n == max)
            .map(|(theme, _)| theme)
            .collect()
    }

    /// Picks the winning theme once `player_count` players have voted.
    ///
    /// Returns `None` while votes are still missing (or nobody is left).
    /// Ties at the maximum are broken uniformly at random.
    pub fn winner(&self, player_count: usize, rng: &dyn RandomSource) -> Option<String> {
        if player_count == 0 || self.voter_count() != player_count {
            return None;
        }
        let leaders = self.leaders();
        if leaders.is_empty() {
            return None;
        }
        Some(leaders[rng.index(leaders.len())].to_owned())
    }

    /// Checks both views agree. Used by tests after every mutation.
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .by_theme
            .iter()
            .flat_map(|(t, voters)| voters.iter().map(move |p| (p, t)))
            .all(|(p, t)| self.by_player.get(p) == Some(t));
        let total: usize = self.by_theme.values().map(BTreeSet::len).sum();
        forward && total == self.by_player.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::random::{SeededRandom, ThreadRandom};

    fn pid(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    #[test]
    fn test_cast_counts_distinct_voters() {
        let mut votes = VoteState::new();
        assert_eq!(votes.cast(pid("a"), "Smells"), 1);
        assert_eq!(votes.cast(pid("b"), "Smells"), 2);
        assert!(votes.is_consistent());
    }

    #[test]
    fn test_cast_revote_moves_vote_between_themes() {
        let mut votes = VoteState::new();
        votes.cast(pid("a"), "Smells");
        let count = votes.cast(pid("a"), "Sports");

        assert_eq!(count, 1, "a re-vote is still one voter");
        assert_eq!(votes.retract(&pid("a")).as_deref(), Some("Sports"));
        votes.cast(pid("a"), "Sports");
        assert_eq!(votes.tally(), vec![("Sports", 1)]);
        assert!(votes.is_consistent());
    }

    #[test]
    fn test_cast_same_theme_twice_is_idempotent() {
        let mut votes = VoteState::new();
        votes.cast(pid("a"), "Smells");
        votes.cast(pid("a"), "Smells");
        assert_eq!(votes.tally(), vec![("Smells", 1)]);
        assert!(votes.is_consistent());
    }

    #[test]
    fn test_retract_removes_from_both_views() {
        let mut votes = VoteState::new();
        votes.cast(pid("a"), "Smells");
        votes.cast(pid("b"), "Smells");

        assert_eq!(votes.retract(&pid("a")), Some("Smells".to_owned()));
        assert_eq!(votes.retract(&pid("a")), None);
        assert_eq!(votes.voter_count(), 1);
        assert_eq!(votes.tally(), vec![("Smells", 1)]);
        assert!(votes.is_consistent());
    }

    #[test]
    fn test_winner_none_until_everyone_voted() {
        let mut votes = VoteState::new();
        votes.cast(pid("a"), "A");
        votes.cast(pid("b"), "A");
        assert_eq!(votes.winner(3, &ThreadRandom), None);
        assert_eq!(votes.winner(0, &ThreadRandom), None);
    }

    #[test]
    fn test_winner_clear_majority_is_deterministic() {
        let mut votes = VoteState::new();
        votes.cast(pid("a"), "A");
        votes.cast(pid("b"), "A");
        votes.cast(pid("c"), "B");
        for seed in 0..50 {
            assert_eq!(
                votes.winner(3, &SeededRandom::new(seed)).as_deref(),
                Some("A")
            );
        }
    }

    #[test]
    fn test_winner_three_way_tie_covers_every_leader() {
        let mut votes = VoteState::new();
        votes.cast(pid("a"), "A");
        votes.cast(pid("b"), "B");
        votes.cast(pid("c"), "C");
        assert_eq!(votes.leaders(), vec!["A", "B", "C"]);

        let rng = SeededRandom::new(2024);
        let mut seen: HashMap<String, usize> = HashMap::new();
        for _ in 0..3000 {
            let winner = votes.winner(3, &rng).expect("all voted");
            *seen.entry(winner).or_default() += 1;
        }
        assert_eq!(seen.len(), 3, "every tied theme must be able to win");
        for (theme, hits) in &seen {
            // Expected 1000 each; generous bounds keep this stable.
            assert!((800..=1200).contains(hits), "{theme} won {hits} times");
        }
    }
}
