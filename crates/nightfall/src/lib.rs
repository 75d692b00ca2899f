//! # Nightfall
//!
//! WebSocket server for Nightfall, a hidden-role party game in the Mafia
//! tradition: a hidden Mafia kills at night, the town argues and votes by
//! day, and a lone Serial Killer may play for itself.
//!
//! Clients speak JSON over a WebSocket. Every frame the server sends is an
//! [`Envelope`](nightfall_protocol::Envelope) around a
//! [`ServerEvent`](nightfall_game::ServerEvent); clients send a
//! [`ClientIntent`](nightfall_game::ClientIntent), bare or enveloped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nightfall::prelude::*;
//!
//! # async fn run() -> Result<(), NightfallError> {
//! let server = NightfallServer::builder()
//!     .bind("0.0.0.0:3099")
//!     .room_config(RoomConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::NightfallError;
pub use server::{DEFAULT_BIND, DEFAULT_IDLE_TIMEOUT, NightfallServer, NightfallServerBuilder};

/// Everything needed to run a server or speak its protocol.
pub mod prelude {
    pub use crate::{NightfallError, NightfallServer, NightfallServerBuilder};
    pub use nightfall_game::{
        ClientIntent, Faction, Finding, GameConfig, GameError, Phase, PlayerRef, PlayerView,
        RevealedPlayer, Role, ServerEvent, SessionState, VoteCount,
    };
    pub use nightfall_protocol::{Codec, Envelope, JsonCodec, PlayerId, RoomCode};
    pub use nightfall_room::{RoomConfig, RoomError};
}
