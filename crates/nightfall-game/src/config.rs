use serde::{Deserialize, Serialize};

use crate::GameError;

/// Host-chosen settings sent with `start_game`.
///
/// Field names are camelCase on the wire (`mafiaCount`, `includeDoctor`,
/// ...). Missing fields take their defaults and unknown fields are ignored,
/// so a client sending a stale `playerCount` still starts a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub mafia_count: usize,
    pub include_doctor: bool,
    pub include_police: bool,
    pub include_teller: bool,
    pub include_killer: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mafia_count: 1,
            include_doctor: false,
            include_police: false,
            include_teller: false,
            include_killer: false,
        }
    }
}

impl GameConfig {
    /// Number of single-seat specials switched on.
    pub fn special_count(&self) -> usize {
        [
            self.include_doctor,
            self.include_police,
            self.include_teller,
            self.include_killer,
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }

    /// Seats needed before any Citizen is dealt. Saturates, so an absurd
    /// Mafia count still compares as too many.
    pub fn required_roles(&self) -> usize {
        self.mafia_count.saturating_add(self.special_count())
    }

    /// Checks these settings against the table about to be dealt.
    pub fn validate(&self, seated: usize, min_players: usize) -> Result<(), GameError> {
        if self.mafia_count == 0 {
            return Err(GameError::InvalidConfig(
                "at least one Mafia is required".into(),
            ));
        }
        if self.mafia_count > seated {
            return Err(GameError::InvalidConfig(format!(
                "{} Mafia requested but only {seated} players are seated",
                self.mafia_count
            )));
        }
        if seated < min_players {
            return Err(GameError::InvalidConfig(format!(
                "need at least {min_players} players to start, have {seated}"
            )));
        }
        if self.required_roles() > seated {
            return Err(GameError::InvalidConfig(format!(
                "settings need {} roles but only {seated} players are seated",
                self.required_roles()
            )));
        }
        Ok(())
    }
}
