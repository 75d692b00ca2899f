//! Per-connection handler: decoding, routing, and the outbound writer.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign the connection a `PlayerId` and open its event channel
//!   2. Spawn the writer: events → `Envelope` → frames
//!   3. Loop: receive intents → registry or room
//!   4. On exit, leave whatever room the player sits in

use std::sync::Arc;

use nightfall_game::{ClientIntent, ServerEvent};
use nightfall_protocol::{Codec, Envelope, PlayerId, ProtocolError, RoomCode};
use nightfall_room::{PlayerSender, RoomError, RoomIntent};
use nightfall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::NightfallError;
use crate::server::ServerState;

/// Drop guard that takes the player out of their room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct DisconnectGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            match registry.leave(player_id).await {
                Ok(()) => tracing::info!(%player_id, "player disconnected from room"),
                // Never joined, already left, or the seat was taken over.
                Err(RoomError::NotSeated(_)) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "disconnect cleanup failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), NightfallError> {
    let conn = Arc::new(conn);
    let player_id = PlayerId(conn.id().into_inner());
    tracing::debug!(conn_id = %conn.id(), peer = %conn.peer_addr(), %player_id, "handling new connection");

    let (outbox, events) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), events));

    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let result = read_intents(&conn, &state, player_id, &outbox).await;

    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → the player leaves their room.
    result
}

/// Receives frames until the peer closes, errors, or goes quiet.
async fn read_intents<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    player_id: PlayerId,
    outbox: &PlayerSender,
) -> Result<(), NightfallError> {
    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                return Ok(());
            }
        };

        let intent = match decode_intent(&state.codec, &data) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to decode intent");
                let _ = outbox.send(ServerEvent::error(400, format!("invalid message: {e}")));
                continue;
            }
        };

        let name = intent.name();
        let room = intent.room_code().cloned();
        if let Err(e) = handle_intent(state, player_id, intent, outbox).await {
            tracing::debug!(%player_id, intent = name, room = ?room, error = %e, "intent failed");
            let _ = outbox.send(ServerEvent::error(e.code(), e.to_string()));
        }
    }
}

/// Accepts an intent wrapped in an [`Envelope`] or sent bare.
fn decode_intent<C: Codec>(codec: &C, data: &[u8]) -> Result<ClientIntent, ProtocolError> {
    match codec.decode::<Envelope<ClientIntent>>(data) {
        Ok(envelope) => Ok(envelope.payload),
        Err(_) => codec.decode(data),
    }
}

async fn handle_intent<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    intent: ClientIntent,
    outbox: &PlayerSender,
) -> Result<(), NightfallError> {
    match intent {
        ClientIntent::JoinGame {
            room_code,
            player_name,
            ..
        } => {
            let code = RoomCode::parse(room_code.as_str())?;
            // Lock only for the join; the room replies through `outbox`.
            let seat = {
                let mut registry = state.registry.lock().await;
                registry.join(code.clone(), player_id, &player_name, outbox.clone()).await?
            };
            tracing::info!(room = %code, %player_id, name = %seat.player.name, host = seat.player.is_host, "player joined room");
        }
        ClientIntent::LeaveGame { room_code } => {
            let mut registry = state.registry.lock().await;
            registry.handle_for(player_id, &room_code)?;
            registry.leave(player_id).await?;
            tracing::info!(room = %room_code, %player_id, "player left room");
        }
        ClientIntent::Heartbeat { client_time } => {
            let _ = outbox.send(ServerEvent::HeartbeatAck {
                client_time,
                server_time: state.uptime_ms(),
            });
        }
        ClientIntent::StartGame {
            room_code,
            settings,
        } => route(state, player_id, &room_code, RoomIntent::Start(settings)).await?,
        ClientIntent::NightAction {
            room_code,
            target_id,
            action,
        } => {
            let intent = RoomIntent::NightAction {
                target: target_id,
                action,
            };
            route(state, player_id, &room_code, intent).await?
        }
        ClientIntent::Vote {
            room_code,
            target_id,
        } => route(state, player_id, &room_code, RoomIntent::Vote { target: target_id }).await?,
        ClientIntent::EndPhase {
            room_code,
            phase,
            round,
        } => route(state, player_id, &room_code, RoomIntent::EndPhase { phase, round }).await?,
        ClientIntent::GetGameState { room_code } => {
            route(state, player_id, &room_code, RoomIntent::GetState).await?
        }
    }
    Ok(())
}

/// Forwards a game request to the player's room.
///
/// The registry lock is held only to look up the room handle.
async fn route<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: &RoomCode,
    intent: RoomIntent,
) -> Result<(), RoomError> {
    let handle = state.registry.lock().await.handle_for(player_id, code)?;
    handle.send_intent(player_id, intent).await
}

/// Drains the player's event channel onto the socket, one envelope per
/// event with a per-connection sequence number.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let mut seq: u64 = 1;
    while let Some(event) = events.recv().await {
        let envelope = Envelope::new(next_seq(&mut seq), state.uptime_ms(), &event);
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, writer stopping");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
