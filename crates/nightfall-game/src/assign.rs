//! Dealing roles at game start.

use nightfall_protocol::PlayerId;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{GameConfig, GameError, Player, Role};

/// Builds the multiset of roles for `seats` players: the configured Mafia,
/// one of each enabled special, Citizens for the rest.
pub fn role_pool(seats: usize, config: &GameConfig) -> Result<Vec<Role>, GameError> {
    if config.required_roles() > seats {
        return Err(GameError::InvalidConfig(format!(
            "settings need {} roles but only {seats} players are seated",
            config.required_roles()
        )));
    }
    let mut pool = Vec::with_capacity(seats);
    pool.extend(std::iter::repeat_n(Role::Mafia, config.mafia_count));
    for (enabled, role) in [
        (config.include_doctor, Role::Doctor),
        (config.include_police, Role::Police),
        (config.include_teller, Role::FortuneTeller),
        (config.include_killer, Role::SerialKiller),
    ] {
        if enabled {
            pool.push(role);
        }
    }
    pool.resize(seats, Role::Citizen);
    Ok(pool)
}

/// Shuffles the pool and deals it out in seating order.
///
/// Every permutation of the pool is equally likely for a uniform `rng`;
/// pass a seeded one to replay a deal.
pub fn assign_roles<R: Rng + ?Sized>(
    roster: &mut [Player],
    config: &GameConfig,
    rng: &mut R,
) -> Result<Vec<(PlayerId, Role)>, GameError> {
    let mut pool = role_pool(roster.len(), config)?;
    pool.shuffle(rng);
    Ok(roster
        .iter_mut()
        .zip(pool)
        .map(|(player, role)| {
            player.role = Some(role);
            (player.id, role)
        })
        .collect())
}
