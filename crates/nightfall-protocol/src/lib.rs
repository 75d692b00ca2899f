//! Wire-level building blocks for Nightfall.
//!
//! This crate knows nothing about roles, phases, or rooms. It provides the
//! pieces every other layer agrees on:
//!
//! - **Identity** ([`PlayerId`], [`RoomCode`]): who is talking and where.
//! - **Addressing** ([`Recipient`]): who should receive an outbound event.
//! - **Framing** ([`Envelope`]): sequence number and timestamp around a
//!   payload.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, values out.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<P>) → Game (intents / events)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Envelope, PlayerId, Recipient, RoomCode};
