//! Role catalog: every role a seat can hold, its faction, and its blurb.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A secret role dealt to one player at game start.
///
/// Serialized with the display labels clients show (`"Fortune Teller"`,
/// `"Serial Killer"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Mafia,
    Police,
    Doctor,
    Citizen,
    #[serde(rename = "Fortune Teller")]
    FortuneTeller,
    #[serde(rename = "Serial Killer")]
    SerialKiller,
}

impl Role {
    /// Every role, in catalog order.
    pub const ALL: [Role; 6] = [
        Role::Mafia,
        Role::Police,
        Role::Doctor,
        Role::Citizen,
        Role::FortuneTeller,
        Role::SerialKiller,
    ];

    /// Human-readable label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Role::Mafia => "Mafia",
            Role::Police => "Police",
            Role::Doctor => "Doctor",
            Role::Citizen => "Citizen",
            Role::FortuneTeller => "Fortune Teller",
            Role::SerialKiller => "Serial Killer",
        }
    }

    /// Looks a role up by label, ignoring ASCII case.
    pub fn from_label(label: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.label().eq_ignore_ascii_case(label.trim()))
    }

    /// The text shown to a player when they are dealt this role.
    pub fn description(self) -> &'static str {
        match self {
            Role::Mafia => "Kill one person each night. Blend in during the day.",
            Role::Police => "Investigate one player each night to learn if they are evil.",
            Role::Doctor => "Choose one player to protect each night.",
            Role::Citizen => "Find and eliminate the Mafia during day discussions.",
            Role::FortuneTeller => "See the role of one player each night.",
            Role::SerialKiller => {
                "Kill one person each night. Win by being the last one standing."
            }
        }
    }

    /// The win-condition grouping this role counts toward.
    pub fn faction(self) -> Faction {
        match self {
            Role::Mafia => Faction::Mafia,
            Role::SerialKiller => Faction::SerialKiller,
            _ => Faction::Town,
        }
    }

    /// What a police investigation reports for this role.
    pub fn is_evil(self) -> bool {
        self.faction() != Faction::Town
    }

    /// The verb acknowledged back to a player acting at night, or `None`
    /// for roles that sleep through the night.
    pub fn night_action(self) -> Option<&'static str> {
        match self {
            Role::Mafia | Role::SerialKiller => Some("kill"),
            Role::Doctor => Some("protect"),
            Role::Police => Some("investigate"),
            Role::FortuneTeller => Some("foresee"),
            Role::Citizen => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Describes a role given its label. Unknown labels yield empty text so
/// older clients keep working when the catalog grows.
pub fn describe(label: &str) -> &'static str {
    Role::from_label(label).map(Role::description).unwrap_or("")
}

/// Win-condition grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Town,
    Mafia,
    #[serde(rename = "Serial Killer")]
    SerialKiller,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::Town => f.write_str("Town"),
            Faction::Mafia => f.write_str("Mafia"),
            Faction::SerialKiller => f.write_str("Serial Killer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_roles() {
        assert_eq!(
            describe("Doctor"),
            "Choose one player to protect each night."
        );
        assert_eq!(
            describe("fortune teller"),
            "See the role of one player each night."
        );
    }

    #[test]
    fn test_describe_unknown_role_is_empty() {
        assert_eq!(describe("Jester"), "");
        assert_eq!(describe(""), "");
    }

    #[test]
    fn test_label_round_trips_through_from_label() {
        for role in Role::ALL {
            assert_eq!(Role::from_label(role.label()), Some(role));
        }
    }

    #[test]
    fn test_serialized_form_matches_label() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.label()));
        }
    }

    #[test]
    fn test_factions() {
        assert_eq!(Role::Mafia.faction(), Faction::Mafia);
        assert_eq!(Role::SerialKiller.faction(), Faction::SerialKiller);
        for role in [Role::Police, Role::Doctor, Role::Citizen, Role::FortuneTeller] {
            assert_eq!(role.faction(), Faction::Town, "{role}");
            assert!(!role.is_evil());
        }
        assert!(Role::Mafia.is_evil());
        assert!(Role::SerialKiller.is_evil());
    }

    #[test]
    fn test_only_citizens_sleep() {
        assert_eq!(Role::Citizen.night_action(), None);
        assert_eq!(Role::Doctor.night_action(), Some("protect"));
    }

    #[test]
    fn test_faction_display() {
        assert_eq!(Faction::SerialKiller.to_string(), "Serial Killer");
        assert_eq!(
            serde_json::to_string(&Faction::SerialKiller).unwrap(),
            "\"Serial Killer\""
        );
    }
}
