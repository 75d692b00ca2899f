//! Room configuration.

use std::time::Duration;

use nightfall_game::SessionRules;
use serde::{Deserialize, Serialize};

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// How long a night lasts before it resolves on its own.
    pub night_duration: Duration,

    /// How long a day lasts before it resolves on its own.
    pub day_duration: Duration,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        let rules = SessionRules::default();
        Self {
            min_players: rules.min_players,
            max_players: rules.max_players,
            night_duration: rules.night_duration,
            day_duration: rules.day_duration,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// The subset of this config the game session enforces.
    pub fn session_rules(&self) -> SessionRules {
        SessionRules {
            min_players: self.min_players,
            max_players: self.max_players,
            night_duration: self.night_duration,
            day_duration: self.day_duration,
        }
    }
}
