//! Room configuration.

use serde::{Deserialize, Serialize};

use crate::RoomError;

/// Settings shared by every room the registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// How many themes are drawn from the catalog when voting starts.
    pub theme_options: usize,

    /// Smallest secret number (inclusive).
    pub number_min: u32,

    /// Largest secret number (inclusive).
    pub number_max: u32,

    /// Maximum players per room. Clamped to the size of the number range,
    /// since every player needs a distinct number.
    pub max_players: usize,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            theme_options: 5,
            number_min: 1,
            number_max: 100,
            max_players: 100,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Number of distinct values in `number_min..=number_max`.
    pub fn number_range_len(&self) -> usize {
        if self.number_max < self.number_min {
            return 0;
        }
        (self.number_max - self.number_min) as usize + 1
    }

    /// The effective per-room player limit.
    pub fn capacity(&self) -> usize {
        self.max_players.min(self.number_range_len())
    }

    /// Checks the settings are usable.
    ///
    /// # Errors
    /// Returns [`RoomError::Config`] for an empty or non-positive number
    /// range, zero theme options, zero capacity, or a zero-sized channel.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.number_min == 0 {
            return Err(RoomError::Config(
                "number_min must be a positive integer".into(),
            ));
        }
        if self.number_max < self.number_min {
            return Err(RoomError::Config(format!(
                "number range {}..={} is empty",
                self.number_min, self.number_max
            )));
        }
        if self.theme_options == 0 {
            return Err(RoomError::Config("theme_options must be at least 1".into()));
        }
        if self.capacity() == 0 {
            return Err(RoomError::Config("max_players must be at least 1".into()));
        }
        if self.channel_size == 0 {
            return Err(RoomError::Config("channel_size must be at least 1".into()));
        }
        Ok(())
    }
}
