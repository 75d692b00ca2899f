//! The per-room state machine.
//!
//! ```text
//! Waiting ─start─► Playing(Night, 1) ─► Playing(Day, 1) ─► Playing(Night, 2) ─► … ─► Ended
//! ```
//!
//! Every operation either fails with a [`GameError`] and leaves the session
//! untouched, or applies its mutation in full and returns the events to
//! send as `(Recipient, ServerEvent)` pairs. The session never performs
//! I/O and never looks at a clock: deadlines are owned by the caller, which
//! reads [`Session::phase_key`] after each call to decide what to arm.

use std::fmt;
use std::time::Duration;

use nightfall_protocol::{PlayerId, Recipient, RoomCode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assign::assign_roles;
use crate::ledger::{NightLedger, Submissions};
use crate::player::find;
use crate::resolve::{resolve_day, resolve_night};
use crate::win::evaluate;
use crate::{
    Faction, FactionCounts, GameConfig, GameError, Player, PlayerRef, PlayerView,
    RevealedPlayer, ServerEvent, VoteCount,
};

/// An event paired with who should receive it.
pub type Outbound = (Recipient, ServerEvent);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    None,
    Night,
    Day,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::None => "none",
            Phase::Night => "night",
            Phase::Day => "day",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Waiting,
    Playing,
    Ended,
}

/// Identifies one concrete phase of one game. Deadlines are armed for a
/// key and ignored once the session has moved past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseKey {
    pub phase: Phase,
    pub round: u32,
}

impl fmt::Display for PhaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phase, self.round)
    }
}

/// Table limits and phase lengths for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRules {
    pub min_players: usize,
    pub max_players: usize,
    pub night_duration: Duration,
    pub day_duration: Duration,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            min_players: 4,
            max_players: 16,
            night_duration: Duration::from_secs(60),
            day_duration: Duration::from_secs(120),
        }
    }
}

impl SessionRules {
    pub fn duration_of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Night => self.night_duration,
            Phase::Day => self.day_duration,
            Phase::None => Duration::ZERO,
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub player: PlayerView,
    /// The identity the seat was bound to before this join, when the join
    /// reclaimed an existing seat by name.
    pub rebound_from: Option<PlayerId>,
}

/// One room's game.
#[derive(Debug)]
pub struct Session {
    code: RoomCode,
    rules: SessionRules,
    roster: Vec<Player>,
    /// Mid-game departures, kept so a rejoin by name restores the seat.
    departed: Vec<Player>,
    state: SessionState,
    phase: Phase,
    round: u32,
    config: Option<GameConfig>,
    night: NightLedger,
    votes: Submissions,
    counts: FactionCounts,
    winner: Option<Faction>,
}

impl Session {
    pub fn new(code: RoomCode, rules: SessionRules) -> Self {
        Self {
            code,
            rules,
            roster: Vec::new(),
            departed: Vec::new(),
            state: SessionState::Waiting,
            phase: Phase::None,
            round: 0,
            config: None,
            night: NightLedger::new(),
            votes: Submissions::new(),
            counts: FactionCounts::default(),
            winner: None,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        find(&self.roster, id)
    }

    pub fn config(&self) -> Option<&GameConfig> {
        self.config.as_ref()
    }

    pub fn counts(&self) -> FactionCounts {
        self.counts
    }

    pub fn winner(&self) -> Option<Faction> {
        self.winner
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn night_ledger(&self) -> &NightLedger {
        &self.night
    }

    pub fn votes(&self) -> &Submissions {
        &self.votes
    }

    /// The phase currently running, or `None` outside of play.
    pub fn phase_key(&self) -> Option<PhaseKey> {
        (self.state == SessionState::Playing).then_some(PhaseKey {
            phase: self.phase,
            round: self.round,
        })
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Seats `id` under `name`.
    ///
    /// A name already at the table (or parked by a mid-game departure)
    /// reclaims that seat: role, aliveness and host flag carry over and the
    /// roster does not grow. New names are only accepted while waiting.
    pub fn join(&mut self, id: PlayerId, name: &str) -> Result<(Seat, Vec<Outbound>), GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::forbidden("display name must not be empty"));
        }
        if find(&self.roster, id).is_some() {
            return Err(GameError::forbidden(format!(
                "already seated in room {}",
                self.code
            )));
        }

        let has_host = self.roster.iter().any(|p| p.is_host);
        let rebound_from = if let Some(seat) = self.roster.iter_mut().find(|p| p.answers_to(name)) {
            Some(std::mem::replace(&mut seat.id, id))
        } else if let Some(pos) = self.departed.iter().position(|p| p.answers_to(name)) {
            let mut seat = self.departed.remove(pos);
            seat.is_host = seat.is_host || !has_host;
            let old = std::mem::replace(&mut seat.id, id);
            self.roster.push(seat);
            Some(old)
        } else {
            if self.state != SessionState::Waiting {
                return Err(GameError::forbidden("game already in progress"));
            }
            if self.roster.len() >= self.rules.max_players {
                return Err(GameError::forbidden(format!(
                    "room {} is full",
                    self.code
                )));
            }
            self.roster.push(Player::new(id, name, !has_host));
            None
        };

        if let Some(old) = rebound_from {
            self.night.rebind(old, id);
            self.votes.rebind(old, id);
        }

        let Some(player) = find(&self.roster, id) else {
            return Err(GameError::not_found(format!("{id} lost its seat")));
        };
        info!(
            room = %self.code,
            player_id = %id,
            name = %player.name,
            rebound_from = ?rebound_from,
            host = player.is_host,
            "player seated"
        );

        let seat = Seat {
            player: PlayerView::from(player),
            rebound_from,
        };
        let players = self.views();
        let mut out = vec![
            (
                Recipient::All,
                ServerEvent::PlayerJoined {
                    players: players.clone(),
                },
            ),
            (
                Recipient::Player(id),
                ServerEvent::PlayerList {
                    room_code: self.code.clone(),
                    you: id,
                    players,
                },
            ),
        ];
        if let (SessionState::Playing, Some(role)) = (self.state, player.role) {
            out.push((Recipient::Player(id), ServerEvent::role_assigned(role)));
        }
        Ok((seat, out))
    }

    /// Removes `id` from the table.
    ///
    /// The host role passes to the first remaining seat. Mid-game the seat
    /// is parked for a later rejoin and its own submissions are dropped; if
    /// that leaves every living player voted, the day resolves.
    pub fn leave(&mut self, id: PlayerId) -> Result<Vec<Outbound>, GameError> {
        let pos = self
            .roster
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| GameError::not_found(format!("{id} is not in room {}", self.code)))?;
        let mut seat = self.roster.remove(pos);
        self.night.remove_actor(id);
        self.votes.remove_actor(id);

        if seat.is_host {
            if let Some(next) = self.roster.first_mut() {
                next.is_host = true;
                seat.is_host = false;
                info!(room = %self.code, player_id = %next.id, "host passed on");
            }
        }
        info!(room = %self.code, player_id = %id, name = %seat.name, "player left");

        if self.state != SessionState::Waiting {
            self.departed.push(seat);
        }

        let mut out = vec![(
            Recipient::All,
            ServerEvent::PlayerLeft {
                player_id: id,
                players: self.views(),
            },
        )];
        if self.day_complete() {
            out.extend(self.resolve_current());
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Play
    // -----------------------------------------------------------------------

    /// Deals roles and opens the first night. Host only, while waiting.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        requestor: PlayerId,
        config: GameConfig,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, GameError> {
        match self.state {
            SessionState::Waiting => {}
            SessionState::Playing => return Err(GameError::forbidden("game already started")),
            SessionState::Ended => return Err(GameError::forbidden("game is over")),
        }
        self.require_host(requestor, "start the game")?;
        config.validate(self.roster.len(), self.rules.min_players)?;

        self.night.clear();
        self.votes.clear();
        let dealt = assign_roles(&mut self.roster, &config, rng)?;
        self.counts = FactionCounts::tally(&self.roster);
        self.config = Some(config);
        self.state = SessionState::Playing;
        self.round = 1;
        info!(room = %self.code, players = self.roster.len(), ?config, "game started");

        let mut out = vec![(Recipient::All, ServerEvent::GameStarted)];
        out.extend(
            dealt
                .into_iter()
                .map(|(id, role)| (Recipient::Player(id), ServerEvent::role_assigned(role))),
        );
        out.push(self.enter_phase(Phase::Night));
        Ok(out)
    }

    /// Records a night choice for the actor's role; last write wins.
    pub fn submit_night_action(
        &mut self,
        actor: PlayerId,
        target: PlayerId,
        action: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        self.require_phase(Phase::Night, "night actions are only accepted at night")?;
        let role = self.living(actor, "dead players cannot act")?.role;
        let Some((role, verb)) = role.and_then(|r| r.night_action().map(|verb| (r, verb))) else {
            return Err(GameError::forbidden("your role has no night action"));
        };
        self.living(target, "target is already dead")?;

        self.night.record(role, actor, target);
        debug!(room = %self.code, player_id = %actor, %role, target = %target, "night action recorded");

        let action = match action.trim() {
            "" => verb.to_string(),
            label => label.to_string(),
        };
        Ok(vec![(
            Recipient::Player(actor),
            ServerEvent::ActionConfirmed {
                action,
                target_id: target,
            },
        )])
    }

    /// Records a day vote; last write wins. Resolves the day once every
    /// living player has voted.
    pub fn cast_vote(&mut self, voter: PlayerId, target: PlayerId) -> Result<Vec<Outbound>, GameError> {
        self.require_phase(Phase::Day, "votes are only accepted during the day")?;
        let voter_name = self.living(voter, "dead players cannot vote")?.name.clone();
        self.living(target, "cannot vote for a dead player")?;

        self.votes.record(voter, target);
        debug!(room = %self.code, player_id = %voter, target = %target, "vote recorded");

        let mut out = vec![(
            Recipient::All,
            ServerEvent::VoteCast {
                voter_id: voter,
                voter_name,
                target_id: target,
            },
        )];
        if self.day_complete() {
            out.extend(self.resolve_current());
        }
        Ok(out)
    }

    /// Host request to resolve the running phase now.
    ///
    /// `phase`/`round`, when given, name the phase the host means to end;
    /// if the session has already moved past it the call does nothing.
    pub fn end_phase(
        &mut self,
        requestor: PlayerId,
        phase: Option<Phase>,
        round: Option<u32>,
    ) -> Result<Vec<Outbound>, GameError> {
        self.require_host(requestor, "end the phase")?;
        if phase.is_some() || round.is_some() {
            let current = self.phase_key();
            let matches = current.is_some_and(|key| {
                phase.is_none_or(|p| p == key.phase) && round.is_none_or(|r| r == key.round)
            });
            if !matches {
                debug!(room = %self.code, ?phase, ?round, "end_phase for a finished phase ignored");
                return Ok(Vec::new());
            }
        }
        if self.state != SessionState::Playing {
            return Err(GameError::forbidden("no phase is running"));
        }
        info!(room = %self.code, phase = %self.phase, round = self.round, "phase ended by host");
        Ok(self.resolve_current())
    }

    /// Deadline expiry for `key`. Does nothing if that phase is over.
    pub fn expire_phase(&mut self, key: PhaseKey) -> Vec<Outbound> {
        if self.phase_key() != Some(key) {
            debug!(room = %self.code, %key, "stale deadline ignored");
            return Vec::new();
        }
        info!(room = %self.code, %key, "phase deadline reached");
        self.resolve_current()
    }

    /// Snapshot for `requester`, plus their role while a game runs.
    /// `time_left` is the live deadline, which this call never re-arms.
    pub fn game_state(
        &self,
        requester: PlayerId,
        time_left: Option<Duration>,
    ) -> Result<Vec<Outbound>, GameError> {
        let player = find(&self.roster, requester)
            .ok_or_else(|| GameError::not_found(format!("{requester} is not in room {}", self.code)))?;
        let mut out = vec![(
            Recipient::Player(requester),
            ServerEvent::GameState {
                room_code: self.code.clone(),
                state: self.state,
                phase: self.phase,
                round: self.round,
                time_left: time_left.map(whole_seconds),
                players: self.views(),
            },
        )];
        if let (SessionState::Playing, Some(role)) = (self.state, player.role) {
            out.push((Recipient::Player(requester), ServerEvent::role_assigned(role)));
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    fn resolve_current(&mut self) -> Vec<Outbound> {
        match (self.state, self.phase) {
            (SessionState::Playing, Phase::Night) => self.finish_night(),
            (SessionState::Playing, Phase::Day) => self.finish_day(),
            _ => Vec::new(),
        }
    }

    fn finish_night(&mut self) -> Vec<Outbound> {
        let outcome = resolve_night(&mut self.roster, &self.night);
        self.night.clear();
        self.counts = outcome.counts;
        info!(
            room = %self.code,
            round = self.round,
            killed = outcome.killed.len(),
            saved = outcome.saved.len(),
            "night resolved"
        );

        let mut out = vec![(
            Recipient::All,
            ServerEvent::NightResults {
                killed: self.refs(&outcome.killed),
                saved: self.refs(&outcome.saved),
            },
        )];
        for found in &outcome.investigations {
            if let Some(target) = find(&self.roster, found.target) {
                out.push((
                    Recipient::Player(found.investigator),
                    ServerEvent::InvestigationResult {
                        target: PlayerRef::from(target),
                        finding: found.finding,
                    },
                ));
            }
        }
        out.extend(self.advance(Phase::Day));
        out
    }

    fn finish_day(&mut self) -> Vec<Outbound> {
        let outcome = resolve_day(&mut self.roster, &self.votes);
        self.votes.clear();
        self.counts = outcome.counts;
        info!(
            room = %self.code,
            round = self.round,
            eliminated = ?outcome.eliminated,
            "day resolved"
        );

        let eliminated = outcome
            .eliminated
            .and_then(|id| find(&self.roster, id))
            .map(RevealedPlayer::from);
        let vote_counts = outcome
            .tally
            .into_iter()
            .map(|(target_id, votes)| VoteCount { target_id, votes })
            .collect();
        let mut out = vec![(
            Recipient::All,
            ServerEvent::VoteResults {
                vote_counts,
                eliminated,
            },
        )];
        out.extend(self.advance(Phase::Night));
        out
    }

    /// Ends the game if a faction has won, otherwise opens `next`.
    fn advance(&mut self, next: Phase) -> Vec<Outbound> {
        self.night.clear();
        self.votes.clear();
        if let Some(winner) = evaluate(&self.counts) {
            self.state = SessionState::Ended;
            self.phase = Phase::None;
            self.winner = Some(winner);
            info!(room = %self.code, %winner, round = self.round, "game over");
            return vec![(
                Recipient::All,
                ServerEvent::GameOver {
                    winner,
                    players: self.roster.iter().map(RevealedPlayer::from).collect(),
                },
            )];
        }
        if next == Phase::Night {
            self.round += 1;
        }
        vec![self.enter_phase(next)]
    }

    fn enter_phase(&mut self, phase: Phase) -> Outbound {
        self.phase = phase;
        let time_left = self.rules.duration_of(phase);
        info!(room = %self.code, %phase, round = self.round, "phase changed");
        (
            Recipient::All,
            ServerEvent::PhaseChanged {
                phase,
                round: self.round,
                time_left: whole_seconds(time_left),
                alive_players: self
                    .roster
                    .iter()
                    .filter(|p| p.is_alive)
                    .map(PlayerRef::from)
                    .collect(),
            },
        )
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// True during a day with at least one vote and no living player
    /// still to vote.
    fn day_complete(&self) -> bool {
        self.state == SessionState::Playing
            && self.phase == Phase::Day
            && !self.votes.is_empty()
            && self
                .roster
                .iter()
                .filter(|p| p.is_alive)
                .all(|p| self.votes.target_of(p.id).is_some())
    }

    fn require_host(&self, id: PlayerId, what: &str) -> Result<&Player, GameError> {
        let player = find(&self.roster, id)
            .ok_or_else(|| GameError::not_found(format!("{id} is not in room {}", self.code)))?;
        if !player.is_host {
            return Err(GameError::forbidden(format!("only the host may {what}")));
        }
        Ok(player)
    }

    fn require_phase(&self, phase: Phase, reason: &str) -> Result<(), GameError> {
        if self.state != SessionState::Playing || self.phase != phase {
            return Err(GameError::forbidden(reason));
        }
        Ok(())
    }

    fn living(&self, id: PlayerId, dead: &str) -> Result<&Player, GameError> {
        let player = find(&self.roster, id)
            .ok_or_else(|| GameError::not_found(format!("player {id} not found")))?;
        if !player.is_alive {
            return Err(GameError::forbidden(dead));
        }
        Ok(player)
    }

    fn views(&self) -> Vec<PlayerView> {
        self.roster.iter().map(PlayerView::from).collect()
    }

    fn refs(&self, ids: &[PlayerId]) -> Vec<PlayerRef> {
        ids.iter()
            .filter_map(|id| find(&self.roster, *id))
            .map(PlayerRef::from)
            .collect()
    }
}

/// Rounds up so a client never sees `0` while time remains.
fn whole_seconds(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
