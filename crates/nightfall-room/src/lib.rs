//! Room lifecycle management for Nightfall.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its game
//! session, its phase deadline, and the outbound channels of its players.
//!
//! # Key types
//!
//! - [`SessionRegistry`]: creates/destroys rooms, routes players
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomIntent`]: the game requests a seated player can make
//! - [`RoomConfig`]: table limits, phase lengths, channel sizing

mod config;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::SessionRegistry;
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomIntent};
