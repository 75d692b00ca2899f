use std::time::Duration;

use clap::Parser;
use nightfall::prelude::*;
use tracing_subscriber::EnvFilter;

/// Runs a Nightfall game server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "NIGHTFALL_BIND", default_value = nightfall::DEFAULT_BIND)]
    bind: String,

    /// Length of the night phase in seconds
    #[arg(long, env = "NIGHTFALL_NIGHT_SECS", default_value_t = 60)]
    night_secs: u64,

    /// Length of the day phase in seconds
    #[arg(long, env = "NIGHTFALL_DAY_SECS", default_value_t = 120)]
    day_secs: u64,

    /// Players needed before the host can start
    #[arg(long, env = "NIGHTFALL_MIN_PLAYERS", default_value_t = 4)]
    min_players: usize,

    /// Seed for role deals; random when absent
    #[arg(long, env = "NIGHTFALL_SEED")]
    seed: Option<u64>,
}

impl Args {
    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: self.min_players,
            night_duration: Duration::from_secs(self.night_secs),
            day_duration: Duration::from_secs(self.day_secs),
            ..RoomConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!(bind = %args.bind, night_secs = args.night_secs, day_secs = args.day_secs, min_players = args.min_players, seed = ?args.seed, "starting mafia server");

    let mut builder = NightfallServer::builder()
        .bind(&args.bind)
        .room_config(args.room_config());
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    let server = builder.build().await?;
    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_room_config() {
        let args = Args::try_parse_from([
            "mafia-server",
            "--night-secs",
            "30",
            "--day-secs",
            "90",
            "--min-players",
            "5",
            "--seed",
            "42",
        ])
        .unwrap();
        let config = args.room_config();
        assert_eq!(config.night_duration, Duration::from_secs(30));
        assert_eq!(config.day_duration, Duration::from_secs(90));
        assert_eq!(config.min_players, 5);
        assert_eq!(config.max_players, RoomConfig::default().max_players);
        assert_eq!(args.seed, Some(42));
    }

    #[test]
    fn test_args_are_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
