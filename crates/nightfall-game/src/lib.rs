//! Game rules for Nightfall, a hidden-role social deduction game.
//!
//! Players are secretly dealt roles (Mafia, Police, Doctor, Citizen,
//! Fortune Teller, Serial Killer) and alternate between a Night, where
//! roles act in private, and a Day, where everyone votes someone out.
//!
//! Everything here is synchronous and free of I/O. [`Session`] is the
//! state machine for one room; the free functions in [`assign`],
//! [`resolve`] and [`win`] are the pieces it is built from and can be
//! used on their own.

pub mod assign;
mod config;
mod error;
mod events;
pub mod ledger;
mod player;
pub mod resolve;
mod role;
mod session;
pub mod win;

pub use config::GameConfig;
pub use error::GameError;
pub use events::{
    ClientIntent, PlayerRef, PlayerView, RevealedPlayer, ServerEvent, VoteCount,
};
pub use player::Player;
pub use resolve::Finding;
pub use role::{Faction, Role, describe};
pub use session::{
    Outbound, Phase, PhaseKey, Seat, Session, SessionRules, SessionState,
};
pub use win::FactionCounts;
