//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor is the only writer of its session,
//! so every intent, departure, and deadline is applied one at a time.

use std::collections::HashMap;
use std::time::Duration;

use nightfall_game::{
    GameConfig, GameError, Outbound, Phase, PhaseKey, Seat, ServerEvent, Session, SessionState,
};
use nightfall_protocol::{PlayerId, RoomCode};
use nightfall_timer::{Expiry, PhaseTimer};
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{RoomConfig, RoomError};

/// Channel sender for delivering events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// A game request from a seated player.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomIntent {
    Start(GameConfig),
    NightAction { target: PlayerId, action: String },
    Vote { target: PlayerId },
    EndPhase {
        phase: Option<Phase>,
        round: Option<u32>,
    },
    GetState,
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Seat, RoomError>>,
    },

    /// Replies with the number of players still seated.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Fire-and-forget; failures go back to the sender as an `error` event.
    Intent {
        sender: PlayerId,
        intent: RoomIntent,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub state: SessionState,
    pub phase: Phase,
    pub round: u32,
    pub player_count: usize,
    pub max_players: usize,
    /// Time until the running phase resolves on its own.
    pub time_left: Option<Duration>,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it is just an `mpsc::Sender` wrapper. The registry
/// holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats a player, or rebinds an existing seat with the same name.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            name: name.to_string(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a player, returning how many remain seated.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Queues a game request. The outcome arrives as events on the
    /// player's channel.
    pub async fn send_intent(&self, sender: PlayerId, intent: RoomIntent) -> Result<(), RoomError> {
        self.send(RoomCommand::Intent { sender, intent }).await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to stop. Its pending deadline dies with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    session: Session,
    timer: PhaseTimer<PhaseKey>,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        info!(room = %self.code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                expiry = self.timer.wait() => self.on_deadline(expiry),
            }
        }

        self.timer.cancel();
        info!(room = %self.code, "room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, &name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id);
                let _ = reply.send(result);
            }
            RoomCommand::Intent { sender, intent } => self.handle_intent(sender, intent),
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room = %self.code, "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        // Registered first so the joiner receives their own player_list.
        self.senders.insert(player_id, sender);
        match self.session.join(player_id, name) {
            Ok((seat, out)) => {
                if let Some(old) = seat.rebound_from {
                    self.senders.remove(&old);
                }
                self.dispatch(out);
                Ok(seat)
            }
            Err(e) => {
                self.senders.remove(&player_id);
                Err(e.into())
            }
        }
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<usize, RoomError> {
        let out = self.session.leave(player_id)?;
        self.senders.remove(&player_id);
        self.sync_timer();
        self.dispatch(out);
        Ok(self.session.roster().len())
    }

    fn handle_intent(&mut self, sender: PlayerId, intent: RoomIntent) {
        let result = match intent {
            RoomIntent::Start(config) => self.session.start(sender, config, &mut self.rng),
            RoomIntent::NightAction { target, action } => {
                self.session.submit_night_action(sender, target, &action)
            }
            RoomIntent::Vote { target } => self.session.cast_vote(sender, target),
            RoomIntent::EndPhase { phase, round } => self.session.end_phase(sender, phase, round),
            RoomIntent::GetState => self.session.game_state(sender, self.timer.remaining()),
        };
        self.settle(sender, result);
    }

    fn on_deadline(&mut self, expiry: Expiry<PhaseKey>) {
        if expiry.late_by > Duration::ZERO {
            debug!(room = %self.code, key = %expiry.key, late_ms = expiry.late_by.as_millis() as u64, "deadline handled late");
        }
        let out = self.session.expire_phase(expiry.key);
        self.sync_timer();
        self.dispatch(out);
    }

    /// Applies the outcome of a game call: events go out and the deadline
    /// follows the phase, or the caller alone hears why it was refused.
    fn settle(&mut self, caller: PlayerId, result: Result<Vec<Outbound>, GameError>) {
        match result {
            Ok(out) => {
                self.sync_timer();
                self.dispatch(out);
            }
            Err(e) => {
                debug!(room = %self.code, player_id = %caller, error = %e, "intent rejected");
                self.send_to(caller, ServerEvent::error(e.code(), e.to_string()));
            }
        }
    }

    /// Points the deadline at the running phase: armed for a phase the
    /// timer has not seen, cancelled once play stops.
    fn sync_timer(&mut self) {
        match self.session.phase_key() {
            Some(key) if self.timer.key() == Some(&key) => {}
            Some(key) => {
                let after = self.session.rules().duration_of(key.phase);
                self.timer.arm(key, after);
            }
            None => {
                self.timer.cancel();
            }
        }
    }

    /// Dispatches outbound events to the correct recipients.
    fn dispatch(&self, out: Vec<Outbound>) {
        for (recipient, event) in out {
            for (player_id, sender) in &self.senders {
                if recipient.includes(*player_id) {
                    // Receiver gone means the player disconnected.
                    let _ = sender.send(event.clone());
                }
            }
        }
    }

    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        match self.senders.get(&player_id) {
            Some(sender) => {
                let _ = sender.send(event);
            }
            None => warn!(room = %self.code, %player_id, "no channel for player"),
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            state: self.session.state(),
            phase: self.session.phase(),
            round: self.session.round(),
            player_count: self.session.roster().len(),
            max_players: self.session.rules().max_players,
            time_left: self.timer.remaining(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `config.channel_size` bounds the command channel: once it fills up,
/// senders wait.
pub(crate) fn spawn_room(code: RoomCode, config: &RoomConfig, rng: StdRng) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = RoomActor {
        code: code.clone(),
        session: Session::new(code.clone(), config.session_rules()),
        timer: PhaseTimer::new(),
        senders: HashMap::new(),
        rng,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
