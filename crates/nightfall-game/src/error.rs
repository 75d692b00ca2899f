//! Error types for the game layer.

/// Why an intent was rejected.
///
/// None of these are fatal: the session ignores the intent, stays exactly
/// as it was, and the error is reported to the player who sent it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The room, the acting player, or the target does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The sender may not do this right now: not the host, dead, or the
    /// wrong phase.
    #[error("{0}")]
    Forbidden(String),

    /// The requested game settings cannot be satisfied by the table.
    #[error("{0}")]
    InvalidConfig(String),
}

impl GameError {
    /// HTTP-style status code carried in the `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::InvalidConfig(_) => 422,
        }
    }

    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub(crate) fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }
}
