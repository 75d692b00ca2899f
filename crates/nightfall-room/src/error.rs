//! Error types for the room layer.

use nightfall_game::GameError;
use nightfall_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this code exists.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The player is not seated anywhere.
    #[error("player {0} is not in any room")]
    NotSeated(PlayerId),

    /// The player addressed a room other than the one they sit in.
    #[error("player {0} is not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The player already sits in a room; a connection plays one room at
    /// a time.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The game rejected the request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// Status code reported to the client in an `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::NotSeated(_) | Self::NotInRoom(..) => 404,
            Self::AlreadyInRoom(..) => 403,
            Self::Game(e) => e.code(),
            Self::Unavailable(_) => 503,
        }
    }
}
