//! Phase resolution: applying a finished night or day to the roster.
//!
//! Both resolvers are pure over their inputs: they mutate `is_alive` on the
//! roster and report what happened, nothing else. Notifications are built
//! from the returned outcome by the session.

use nightfall_protocol::PlayerId;
use serde::{Deserialize, Serialize};

use crate::ledger::{NightLedger, Submissions};
use crate::player::{find, find_mut};
use crate::{FactionCounts, Player, Role};

/// What an investigator learned about their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Finding {
    /// Police: whether the target plays for Mafia or the Serial Killer.
    Alignment { is_evil: bool },
    /// Fortune Teller: the target's exact role.
    Role { role: Role },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Investigation {
    pub investigator: PlayerId,
    pub target: PlayerId,
    pub finding: Finding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightOutcome {
    pub killed: Vec<PlayerId>,
    pub saved: Vec<PlayerId>,
    pub investigations: Vec<Investigation>,
    pub counts: FactionCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOutcome {
    /// Votes per target in first-named order.
    pub tally: Vec<(PlayerId, usize)>,
    pub eliminated: Option<PlayerId>,
    pub counts: FactionCounts,
}

/// Resolves one night.
///
/// The Mafia strike the plurality of their submissions, the Serial Killer
/// strikes their latest choice, and the Doctor's latest choice shields
/// against both. A shielded target lands in `saved` once, a struck one in
/// `killed` once; aliveness is checked right before each strike.
pub fn resolve_night(roster: &mut [Player], ledger: &NightLedger) -> NightOutcome {
    let slot = |role| ledger.submissions(role);
    let mafia_target = slot(Role::Mafia).and_then(Submissions::plurality);
    let doctor_target = slot(Role::Doctor).and_then(Submissions::latest_target);
    let killer_target = slot(Role::SerialKiller).and_then(Submissions::latest_target);

    let investigations = investigate(roster, ledger);

    let mut killed = Vec::new();
    let mut saved = Vec::new();
    for target in [mafia_target, killer_target].into_iter().flatten() {
        let Some(player) = find_mut(roster, target) else {
            // Departed mid-night.
            continue;
        };
        if Some(target) == doctor_target {
            if !saved.contains(&target) {
                saved.push(target);
            }
        } else if player.is_alive {
            player.is_alive = false;
            killed.push(target);
        }
    }

    NightOutcome {
        killed,
        saved,
        investigations,
        counts: FactionCounts::tally(roster),
    }
}

fn investigate(roster: &[Player], ledger: &NightLedger) -> Vec<Investigation> {
    let mut found = Vec::new();
    for role in [Role::Police, Role::FortuneTeller] {
        let Some(subs) = ledger.submissions(role) else {
            continue;
        };
        for (investigator, target) in subs.iter() {
            if find(roster, investigator).is_none() {
                continue;
            }
            let Some(target_role) = find(roster, target).and_then(|p| p.role) else {
                continue;
            };
            let finding = match role {
                Role::Police => Finding::Alignment {
                    is_evil: target_role.is_evil(),
                },
                _ => Finding::Role { role: target_role },
            };
            found.push(Investigation {
                investigator,
                target,
                finding,
            });
        }
    }
    found
}

/// Resolves one day: the plurality target is eliminated if anyone voted.
pub fn resolve_day(roster: &mut [Player], votes: &Submissions) -> DayOutcome {
    let tally = votes.tally();
    let eliminated = votes.plurality().filter(|target| {
        match find_mut(roster, *target) {
            Some(player) if player.is_alive => {
                player.is_alive = false;
                true
            }
            _ => false,
        }
    });

    DayOutcome {
        tally,
        eliminated,
        counts: FactionCounts::tally(roster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seats 1..=n with the given roles in order.
    fn table(roles: &[Role]) -> Vec<Player> {
        roles
            .iter()
            .enumerate()
            .map(|(i, role)| {
                let mut p = Player::new(PlayerId(i as u64 + 1), format!("p{}", i + 1), i == 0);
                p.role = Some(*role);
                p
            })
            .collect()
    }

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);
    const P3: PlayerId = PlayerId(3);
    const P4: PlayerId = PlayerId(4);
    const P5: PlayerId = PlayerId(5);

    #[test]
    fn test_unprotected_mafia_target_dies() {
        let mut roster = table(&[Role::Mafia, Role::Citizen, Role::Citizen, Role::Citizen]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, P2);

        let outcome = resolve_night(&mut roster, &ledger);
        assert_eq!(outcome.killed, vec![P2]);
        assert!(outcome.saved.is_empty());
        assert!(!roster[1].is_alive);
        assert_eq!(
            outcome.counts,
            FactionCounts {
                mafia_alive: 1,
                killer_alive: 0,
                town_alive: 2
            }
        );
    }

    #[test]
    fn test_doctor_blocks_both_attacks_on_the_same_target() {
        let mut roster = table(&[
            Role::Mafia,
            Role::SerialKiller,
            Role::Doctor,
            Role::Citizen,
        ]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, P4);
        ledger.record(Role::SerialKiller, P2, P4);
        ledger.record(Role::Doctor, P3, P4);

        let outcome = resolve_night(&mut roster, &ledger);
        assert!(outcome.killed.is_empty());
        assert_eq!(outcome.saved, vec![P4]);
        assert!(roster[3].is_alive);
    }

    #[test]
    fn test_doctor_save_ignores_killer_on_other_target() {
        let mut roster = table(&[
            Role::Mafia,
            Role::SerialKiller,
            Role::Doctor,
            Role::Citizen,
            Role::Citizen,
        ]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, P4);
        ledger.record(Role::SerialKiller, P2, P5);
        ledger.record(Role::Doctor, P3, P4);

        let outcome = resolve_night(&mut roster, &ledger);
        assert_eq!(outcome.saved, vec![P4]);
        assert_eq!(outcome.killed, vec![P5]);
    }

    #[test]
    fn test_shared_target_is_killed_once() {
        let mut roster = table(&[Role::Mafia, Role::SerialKiller, Role::Citizen, Role::Citizen]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, P3);
        ledger.record(Role::SerialKiller, P2, P3);

        let outcome = resolve_night(&mut roster, &ledger);
        assert_eq!(outcome.killed, vec![P3]);
    }

    #[test]
    fn test_killers_can_strike_each_other() {
        let mut roster = table(&[Role::Mafia, Role::SerialKiller, Role::Citizen, Role::Citizen]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, P2);
        ledger.record(Role::SerialKiller, P2, P1);

        let outcome = resolve_night(&mut roster, &ledger);
        assert_eq!(outcome.killed, vec![P2, P1]);
        assert_eq!(outcome.counts.total(), 2);
    }

    #[test]
    fn test_mafia_split_vote_goes_to_first_named() {
        let mut roster = table(&[Role::Mafia, Role::Mafia, Role::Citizen, Role::Citizen]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, P4);
        ledger.record(Role::Mafia, P2, P3);

        let outcome = resolve_night(&mut roster, &ledger);
        assert_eq!(outcome.killed, vec![P4]);
    }

    #[test]
    fn test_departed_target_is_skipped() {
        let mut roster = table(&[Role::Mafia, Role::Citizen, Role::Citizen]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Mafia, P1, PlayerId(99));

        let outcome = resolve_night(&mut roster, &ledger);
        assert!(outcome.killed.is_empty());
        assert!(outcome.saved.is_empty());
    }

    #[test]
    fn test_investigations() {
        let mut roster = table(&[
            Role::Mafia,
            Role::Police,
            Role::FortuneTeller,
            Role::SerialKiller,
        ]);
        let mut ledger = NightLedger::new();
        ledger.record(Role::Police, P2, P4);
        ledger.record(Role::FortuneTeller, P3, P1);

        let outcome = resolve_night(&mut roster, &ledger);
        assert_eq!(
            outcome.investigations,
            vec![
                Investigation {
                    investigator: P2,
                    target: P4,
                    finding: Finding::Alignment { is_evil: true },
                },
                Investigation {
                    investigator: P3,
                    target: P1,
                    finding: Finding::Role { role: Role::Mafia },
                },
            ]
        );
    }

    #[test]
    fn test_finding_wire_shape() {
        let json = serde_json::to_value(Finding::Alignment { is_evil: false }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "alignment", "isEvil": false}));
        let json = serde_json::to_value(Finding::Role {
            role: Role::FortuneTeller,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"kind": "role", "role": "Fortune Teller"}));
    }

    #[test]
    fn test_day_tie_eliminates_first_named() {
        let mut roster = table(&[Role::Mafia, Role::Citizen, Role::Citizen, Role::Citizen]);
        let mut votes = Submissions::new();
        // A, B, A, B
        votes.record(P1, P2);
        votes.record(P2, P3);
        votes.record(P3, P2);
        votes.record(P4, P3);

        let outcome = resolve_day(&mut roster, &votes);
        assert_eq!(outcome.tally, vec![(P2, 2), (P3, 2)]);
        assert_eq!(outcome.eliminated, Some(P2));
        assert!(!roster[1].is_alive);
    }

    #[test]
    fn test_day_without_votes_eliminates_nobody() {
        let mut roster = table(&[Role::Mafia, Role::Citizen, Role::Citizen, Role::Citizen]);
        let outcome = resolve_day(&mut roster, &Submissions::new());
        assert_eq!(outcome.eliminated, None);
        assert!(outcome.tally.is_empty());
        assert!(roster.iter().all(|p| p.is_alive));
    }
}
