//! Faction head-counts and the win rules.

use serde::{Deserialize, Serialize};

use crate::{Faction, Player, Role};

/// Living players per faction.
///
/// Anyone alive who is neither Mafia nor Serial Killer counts as town,
/// including seats not yet dealt a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionCounts {
    pub mafia_alive: usize,
    pub killer_alive: usize,
    pub town_alive: usize,
}

impl FactionCounts {
    pub fn tally(roster: &[Player]) -> Self {
        roster
            .iter()
            .filter(|p| p.is_alive)
            .fold(Self::default(), |mut counts, p| {
                match p.role {
                    Some(Role::Mafia) => counts.mafia_alive += 1,
                    Some(Role::SerialKiller) => counts.killer_alive += 1,
                    _ => counts.town_alive += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.mafia_alive + self.killer_alive + self.town_alive
    }
}

/// Applies the win rules in priority order; the first match decides.
///
/// 1. No Mafia and no Serial Killer alive: Town.
/// 2. Mafia at parity with everyone else and no Serial Killer: Mafia.
/// 3. No Mafia left and the Serial Killer at parity with the town: Serial Killer.
pub fn evaluate(counts: &FactionCounts) -> Option<Faction> {
    let FactionCounts {
        mafia_alive,
        killer_alive,
        town_alive,
    } = *counts;

    if mafia_alive == 0 && killer_alive == 0 {
        return Some(Faction::Town);
    }
    if mafia_alive >= town_alive && killer_alive == 0 {
        return Some(Faction::Mafia);
    }
    if killer_alive > 0 && mafia_alive == 0 && killer_alive >= town_alive {
        return Some(Faction::SerialKiller);
    }
    None
}
