//! Per-phase bookkeeping of who targeted whom.

use std::collections::HashMap;

use nightfall_protocol::PlayerId;

use crate::Role;

/// Ordered `actor -> target` submissions for one phase.
///
/// A repeat submission from the same actor overwrites its target but keeps
/// the actor's original position, so tallies stay in first-submission
/// order. The most recent write is tracked separately for roles that act
/// through a single shared slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submissions {
    entries: Vec<(PlayerId, PlayerId)>,
    latest: Option<PlayerId>,
}

impl Submissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `actor`'s choice, returning the target it replaced.
    pub fn record(&mut self, actor: PlayerId, target: PlayerId) -> Option<PlayerId> {
        self.latest = Some(actor);
        match self.entries.iter_mut().find(|(a, _)| *a == actor) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, target)),
            None => {
                self.entries.push((actor, target));
                None
            }
        }
    }

    pub fn target_of(&self, actor: PlayerId) -> Option<PlayerId> {
        self.entries
            .iter()
            .find(|(a, _)| *a == actor)
            .map(|(_, t)| *t)
    }

    /// Target of the most recent write from any actor.
    pub fn latest_target(&self) -> Option<PlayerId> {
        self.latest.and_then(|actor| self.target_of(actor))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, PlayerId)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts per target in the order each target was first named.
    pub fn tally(&self) -> Vec<(PlayerId, usize)> {
        let mut counts: Vec<(PlayerId, usize)> = Vec::new();
        for (_, target) in &self.entries {
            match counts.iter_mut().find(|(t, _)| t == target) {
                Some((_, n)) => *n += 1,
                None => counts.push((*target, 1)),
            }
        }
        counts
    }

    /// The most-named target. On a tie the target named first wins.
    pub fn plurality(&self) -> Option<PlayerId> {
        let mut leader: Option<(PlayerId, usize)> = None;
        for (target, n) in self.tally() {
            if leader.is_none_or(|(_, best)| n > best) {
                leader = Some((target, n));
            }
        }
        leader.map(|(target, _)| target)
    }

    /// Drops everything `actor` submitted.
    pub fn remove_actor(&mut self, actor: PlayerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(a, _)| *a != actor);
        if self.latest == Some(actor) {
            self.latest = self.entries.last().map(|(a, _)| *a);
        }
        before != self.entries.len()
    }

    /// Moves every reference to `old` over to `new`, as actor and target.
    pub fn rebind(&mut self, old: PlayerId, new: PlayerId) {
        for (actor, target) in &mut self.entries {
            if *actor == old {
                *actor = new;
            }
            if *target == old {
                *target = new;
            }
        }
        if self.latest == Some(old) {
            self.latest = Some(new);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.latest = None;
    }
}

/// Night submissions grouped by the acting role.
#[derive(Debug, Clone, Default)]
pub struct NightLedger {
    by_role: HashMap<Role, Submissions>,
}

impl NightLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, role: Role, actor: PlayerId, target: PlayerId) -> Option<PlayerId> {
        self.by_role.entry(role).or_default().record(actor, target)
    }

    pub fn submissions(&self, role: Role) -> Option<&Submissions> {
        self.by_role.get(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.by_role.values().all(Submissions::is_empty)
    }

    pub fn remove_actor(&mut self, actor: PlayerId) {
        for subs in self.by_role.values_mut() {
            subs.remove_actor(actor);
        }
    }

    pub fn rebind(&mut self, old: PlayerId, new: PlayerId) {
        for subs in self.by_role.values_mut() {
            subs.rebind(old, new);
        }
    }

    pub fn clear(&mut self) {
        self.by_role.clear();
    }
}
