//! Identity, addressing, and framing types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Transport-level identity of a connected participant.
///
/// One `PlayerId` is minted per accepted connection. When a player
/// reconnects they arrive with a fresh `PlayerId`; the room rebinds their
/// seat to it, so a `PlayerId` names a connection, not a person.
///
/// Serialized as a bare number (`42`, not `{"0":42}`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The shared code players type in to meet in the same room.
///
/// Codes are chosen by clients and compared exactly (after trimming
/// surrounding whitespace). A code is unique process-wide for as long as
/// its room has at least one player.
///
/// Serialized as a bare string; decoding trims like [`RoomCode::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Builds a code from client input, trimming surrounding whitespace.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.len() == code.len() {
            Self(code)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Like [`RoomCode::new`], but rejects codes that are empty once trimmed.
    pub fn parse(code: &str) -> Result<Self, ProtocolError> {
        let code = Self::new(code);
        if code.0.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "room code must not be empty".into(),
            ));
        }
        Ok(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive an outbound event.
///
/// Game code returns `(Recipient, Event)` pairs; the room actor fans them
/// out to the matching player channels. Private information (a role, an
/// investigation result) always travels as `Player(..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player currently in the room.
    All,
    /// One player only.
    Player(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is among the recipients.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == player,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Framing around every message on the wire.
///
/// ```text
/// { "seq": 12, "timestamp": 48210, "payload": { "event": "vote_cast", ... } }
/// ```
///
/// `seq` is per-connection and per-direction; `timestamp` is milliseconds
/// since the server started (outbound) or since the client started
/// (inbound). Clients may omit both when sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    /// Auto-incrementing sequence number.
    #[serde(default)]
    pub seq: u64,

    /// Milliseconds since the sender started.
    #[serde(default)]
    pub timestamp: u64,

    /// The message itself.
    pub payload: P,
}

impl<P> Envelope<P> {
    /// Wraps a payload.
    pub fn new(seq: u64, timestamp: u64, payload: P) -> Self {
        Self {
            seq,
            timestamp,
            payload,
        }
    }
}
