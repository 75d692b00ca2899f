//! Session registry: creates rooms on demand and tracks who sits where.

use std::collections::HashMap;

use nightfall_game::Seat;
use nightfall_protocol::{PlayerId, RoomCode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo, RoomIntent};

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from the connection
/// handlers. It is an owned value; the server keeps it behind a mutex.
pub struct SessionRegistry {
    config: RoomConfig,
    /// Base seed for room RNGs. `None` seeds each room from the OS.
    seed: Option<u64>,
    rooms_created: u64,

    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time (key invariant).
    player_rooms: HashMap<PlayerId, RoomCode>,
}

impl SessionRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            seed: None,
            rooms_created: 0,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    /// Makes role deals reproducible: the n-th room created draws from
    /// `seed + n`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Seats a player in the room named by `code`, creating the room on
    /// first reference.
    ///
    /// A name already seated in that room rebinds the seat to `player_id`;
    /// the previous identity is forgotten.
    pub async fn join(
        &mut self,
        code: RoomCode,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<Seat, RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, current.clone()));
        }

        let (handle, created) = match self.rooms.get(&code) {
            Some(handle) => (handle.clone(), false),
            None => (self.create_room(&code), true),
        };

        match handle.join(player_id, name, sender).await {
            Ok(seat) => {
                if let Some(old) = seat.rebound_from {
                    self.player_rooms.remove(&old);
                }
                self.player_rooms.insert(player_id, code);
                Ok(seat)
            }
            Err(e) => {
                if created {
                    self.destroy_room(&code).await;
                }
                Err(e)
            }
        }
    }

    /// Removes a player from their room; an emptied room is destroyed.
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        let code = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NotSeated(player_id))?;

        let Some(handle) = self.rooms.get(&code).cloned() else {
            return Ok(());
        };
        let remaining = handle.leave(player_id).await?;
        if remaining == 0 {
            self.destroy_room(&code).await;
        }
        Ok(())
    }

    /// The handle for `code`, provided `player_id` is seated there.
    ///
    /// Lets callers release the registry lock before talking to the room.
    pub fn handle_for(&self, player_id: PlayerId, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        match self.player_rooms.get(&player_id) {
            Some(current) if current == code => self
                .rooms
                .get(code)
                .cloned()
                .ok_or_else(|| RoomError::NotFound(code.clone())),
            _ => Err(RoomError::NotInRoom(player_id, code.clone())),
        }
    }

    /// Routes a game request from a player to their room.
    pub async fn route(
        &self,
        player_id: PlayerId,
        code: &RoomCode,
        intent: RoomIntent,
    ) -> Result<(), RoomError> {
        self.handle_for(player_id, code)?
            .send_intent(player_id, intent)
            .await
    }

    pub async fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        handle.get_info().await
    }

    /// Returns the room a player is currently in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn create_room(&mut self, code: &RoomCode) -> RoomHandle {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.rooms_created)),
            None => StdRng::from_os_rng(),
        };
        self.rooms_created += 1;

        let handle = spawn_room(code.clone(), &self.config, rng);
        self.rooms.insert(code.clone(), handle.clone());
        info!(room = %code, rooms = self.rooms.len(), "room created");
        handle
    }

    /// Shuts a room down and forgets everyone still mapped to it.
    async fn destroy_room(&mut self, code: &RoomCode) {
        let Some(handle) = self.rooms.remove(code) else {
            return;
        };
        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, room| room != code);
        info!(room = %code, rooms = self.rooms.len(), "room destroyed");
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
