//! Unified error type for the Nightfall server.

use nightfall_game::GameError;
use nightfall_protocol::ProtocolError;
use nightfall_room::RoomError;
use nightfall_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NightfallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not seated, wrong room, room gone).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A rule violation reported by a session.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl NightfallError {
    /// Status code reported to the client in an `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::Protocol(_) => 400,
            Self::Room(e) => e.code(),
            Self::Game(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use nightfall_protocol::{PlayerId, RoomCode};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let nightfall_err: NightfallError = err.into();
        assert!(matches!(nightfall_err, NightfallError::Transport(_)));
        assert!(nightfall_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_room_error_keeps_message() {
        let err = RoomError::NotInRoom(PlayerId(3), RoomCode::new("NIGHT"));
        let nightfall_err: NightfallError = err.into();
        assert!(matches!(nightfall_err, NightfallError::Room(_)));
        assert_eq!(nightfall_err.to_string(), "player P-3 is not in room NIGHT");
    }

    #[test]
    fn test_codes_follow_the_wrapped_error() {
        let decode: NightfallError = ProtocolError::InvalidMessage("empty".into()).into();
        assert_eq!(decode.code(), 400);
        let seated: NightfallError = RoomError::AlreadyInRoom(PlayerId(1), RoomCode::new("A")).into();
        assert_eq!(seated.code(), 403);
        let config: NightfallError = GameError::InvalidConfig("need 4 players".into()).into();
        assert_eq!(config.code(), 422);
    }

    #[test]
    fn test_from_game_error_is_transparent() {
        let nightfall_err: NightfallError = GameError::Forbidden("only the host can start".into()).into();
        assert!(matches!(nightfall_err, NightfallError::Game(_)));
        assert_eq!(nightfall_err.to_string(), "only the host can start");
    }
}
