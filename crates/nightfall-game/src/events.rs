//! Wire vocabulary: intents clients send and events the server emits.
//!
//! Both directions use the adjacently tagged shape
//! `{"event": "vote_cast", "data": {...}}` with camelCase field names.

use nightfall_protocol::{PlayerId, RoomCode};
use serde::{Deserialize, Serialize};

use crate::{Faction, Finding, GameConfig, Phase, Player, Role, SessionState};

/// Everything a client can ask for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientIntent {
    /// `is_host` is accepted for compatibility but the first player to join
    /// a room always hosts it.
    JoinGame {
        room_code: RoomCode,
        player_name: String,
        #[serde(default)]
        is_host: bool,
    },
    StartGame {
        room_code: RoomCode,
        #[serde(default)]
        settings: GameConfig,
    },
    NightAction {
        room_code: RoomCode,
        target_id: PlayerId,
        #[serde(default)]
        action: String,
    },
    Vote {
        room_code: RoomCode,
        target_id: PlayerId,
    },
    /// `phase`/`round` name the phase the host means to end; if it has
    /// already moved on the request does nothing.
    ///
    /// The guard is opt-in. Without `phase` and `round` the request ends
    /// whatever phase is running when it arrives, so two bare requests end
    /// the Night and then the Day. Clients that retry should send both.
    EndPhase {
        room_code: RoomCode,
        #[serde(default)]
        phase: Option<Phase>,
        #[serde(default)]
        round: Option<u32>,
    },
    GetGameState {
        room_code: RoomCode,
    },
    LeaveGame {
        room_code: RoomCode,
    },
    Heartbeat {
        #[serde(default)]
        client_time: u64,
    },
}

impl ClientIntent {
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::JoinGame { room_code, .. }
            | Self::StartGame { room_code, .. }
            | Self::NightAction { room_code, .. }
            | Self::Vote { room_code, .. }
            | Self::EndPhase { room_code, .. }
            | Self::GetGameState { room_code }
            | Self::LeaveGame { room_code } => Some(room_code),
            Self::Heartbeat { .. } => None,
        }
    }

    /// Event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinGame { .. } => "join_game",
            Self::StartGame { .. } => "start_game",
            Self::NightAction { .. } => "night_action",
            Self::Vote { .. } => "vote",
            Self::EndPhase { .. } => "end_phase",
            Self::GetGameState { .. } => "get_game_state",
            Self::LeaveGame { .. } => "leave_game",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Broadcast roster after someone joins or reconnects.
    PlayerJoined { players: Vec<PlayerView> },
    /// Sent to the joiner only, with the id their seat is bound to.
    PlayerList {
        room_code: RoomCode,
        you: PlayerId,
        players: Vec<PlayerView>,
    },
    PlayerLeft {
        player_id: PlayerId,
        players: Vec<PlayerView>,
    },
    GameStarted,
    RoleAssigned { role: Role, description: String },
    PhaseChanged {
        phase: Phase,
        round: u32,
        time_left: u64,
        alive_players: Vec<PlayerRef>,
    },
    ActionConfirmed { action: String, target_id: PlayerId },
    NightResults {
        killed: Vec<PlayerRef>,
        saved: Vec<PlayerRef>,
    },
    InvestigationResult { target: PlayerRef, finding: Finding },
    VoteCast {
        voter_id: PlayerId,
        voter_name: String,
        target_id: PlayerId,
    },
    VoteResults {
        vote_counts: Vec<VoteCount>,
        eliminated: Option<RevealedPlayer>,
    },
    GameOver {
        winner: Faction,
        players: Vec<RevealedPlayer>,
    },
    GameState {
        room_code: RoomCode,
        state: SessionState,
        phase: Phase,
        round: u32,
        time_left: Option<u64>,
        players: Vec<PlayerView>,
    },
    HeartbeatAck { client_time: u64, server_time: u64 },
    Error { code: u16, message: String },
}

impl ServerEvent {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    pub fn role_assigned(role: Role) -> Self {
        Self::RoleAssigned {
            role,
            description: role.description().to_string(),
        }
    }
}

/// Public view of a seat: no role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_alive: bool,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            is_host: p.is_host,
            is_alive: p.is_alive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

impl From<&Player> for PlayerRef {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
        }
    }
}

/// A seat with its role shown, used once a role is public knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>,
    pub is_alive: bool,
}

impl From<&Player> for RevealedPlayer {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            role: p.role,
            is_alive: p.is_alive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCount {
    pub target_id: PlayerId,
    pub votes: usize,
}
