//! `NightfallServer` builder and server loop.
//!
//! This is the entry point for running a Nightfall game server. It ties
//! together all the layers: transport → protocol → room registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use nightfall_protocol::{Codec, JsonCodec};
use nightfall_room::{RoomConfig, SessionRegistry};
use nightfall_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::NightfallError;
use crate::handler::handle_connection;

/// Address the server listens on when none is given.
pub const DEFAULT_BIND: &str = "0.0.0.0:3099";

/// How long a connection may stay silent before it is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started; stamps outbound envelopes.
    pub(crate) fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Nightfall server.
///
/// # Example
///
/// ```rust,no_run
/// use nightfall::prelude::*;
///
/// # async fn run() -> Result<(), NightfallError> {
/// let server = NightfallServer::builder()
///     .bind("127.0.0.1:3099")
///     .seed(7)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NightfallServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    seed: Option<u64>,
    idle_timeout: Duration,
}

impl NightfallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            room_config: RoomConfig::default(),
            seed: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets player limits and phase lengths for every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Makes role deals reproducible. Without a seed each room draws its
    /// randomness from the OS.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<NightfallServer<JsonCodec>, NightfallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let mut registry = SessionRegistry::new(self.room_config);
        if let Some(seed) = self.seed {
            registry = registry.with_seed(seed);
        }

        let state = Arc::new(ServerState {
            registry: Mutex::new(registry),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            started: Instant::now(),
        });

        Ok(NightfallServer { transport, state })
    }
}

impl Default for NightfallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Nightfall game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NightfallServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl NightfallServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> NightfallServerBuilder {
        NightfallServerBuilder::new()
    }
}

impl<C: Codec> NightfallServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NightfallError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), NightfallError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Nightfall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
