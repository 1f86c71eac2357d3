// WebSocket endpoint for room presence.
//
// Each connection authenticates against the identity service before it
// touches any room state; afterwards the connection task owns a select
// loop over inbound frames, the room's outbound channel, and the
// server heartbeat.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tessera_common::protocol::presence::{
    decode_client_message, encode_server_message, ClientMessage, ServerMessage,
};
use tessera_common::types::UserIdentity;

use crate::auth::{CollabVerifier, VerifyError};
use crate::error::ErrorCode;
use crate::rooms::RoomRegistry;

pub(crate) const HEARTBEAT_INTERVAL_MS: u64 = 15_000;
pub(crate) const HEARTBEAT_TIMEOUT_MS: u64 = 10_000;
pub(crate) const MAX_FRAME_BYTES: usize = 65_536;

#[derive(Clone)]
pub struct PresenceRouterState {
    rooms: RoomRegistry,
    verifier: Arc<CollabVerifier>,
}

pub fn router(rooms: RoomRegistry, verifier: Arc<CollabVerifier>) -> Router {
    Router::new()
        .route("/v1/rooms/{room_id}/presence", get(ws_upgrade))
        .with_state(PresenceRouterState { rooms, verifier })
}

#[derive(Debug, Deserialize)]
struct PresenceQuery {
    token: Option<String>,
}

async fn ws_upgrade(
    Path(room_id): Path<String>,
    Query(query): Query<PresenceQuery>,
    State(state): State<PresenceRouterState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.max_frame_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| handle_socket(state, room_id, query.token, socket))
}

async fn handle_socket(
    state: PresenceRouterState,
    room_id: String,
    token: Option<String>,
    mut socket: WebSocket,
) {
    let identity = match authenticate(&state.verifier, token.as_deref(), &room_id).await {
        Ok(identity) => identity,
        Err(code) => {
            reject(&mut socket, code).await;
            return;
        }
    };

    let conn_id = Uuid::new_v4();
    let room = state.rooms.room(&room_id).await;
    let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel::<ServerMessage>();

    let snapshot = room.join(conn_id, identity.clone(), outbound_sender).await;
    info!(
        room_id = %room_id,
        conn_id = %conn_id,
        user_id = %identity.user_id,
        peers = snapshot.len(),
        "presence connection joined"
    );

    if send_server_message(&mut socket, &ServerMessage::PresenceSnapshot { users: snapshot })
        .await
        .is_err()
    {
        room.disconnect(conn_id).await;
        return;
    }

    // Heartbeat: server pings every HEARTBEAT_INTERVAL_MS, disconnects
    // if no pong arrives within HEARTBEAT_TIMEOUT_MS.
    let mut heartbeat_interval = tokio::time::interval(Duration::from_millis(HEARTBEAT_INTERVAL_MS));
    heartbeat_interval.reset(); // skip immediate first tick
    let mut last_pong = Instant::now();
    let heartbeat_timeout = Duration::from_millis(HEARTBEAT_TIMEOUT_MS);

    loop {
        tokio::select! {
            _ = heartbeat_interval.tick() => {
                if last_pong.elapsed() > heartbeat_timeout {
                    warn!(
                        room_id = %room_id,
                        conn_id = %conn_id,
                        "heartbeat timeout, disconnecting"
                    );
                    break;
                }
                if socket.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
            maybe_outbound = outbound_receiver.recv() => {
                match maybe_outbound {
                    Some(outbound_message) => {
                        if send_server_message(&mut socket, &outbound_message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            maybe_message = socket.recv() => {
                let Some(message) = maybe_message else {
                    break;
                };

                match message {
                    Ok(Message::Text(raw_message)) => {
                        // Malformed or unrecognized frames are dropped
                        // silently; nothing is echoed and the
                        // connection stays open.
                        match decode_client_message(&raw_message) {
                            Ok(ClientMessage::PresenceUpdate {
                                current_path,
                                resource_type,
                                resource_id,
                            }) => {
                                if !room
                                    .apply_update(conn_id, current_path, resource_type, resource_id)
                                    .await
                                {
                                    debug!(
                                        room_id = %room_id,
                                        conn_id = %conn_id,
                                        "update from unregistered connection dropped"
                                    );
                                }
                            }
                            Err(error) => {
                                debug!(
                                    room_id = %room_id,
                                    conn_id = %conn_id,
                                    %error,
                                    "malformed presence frame dropped"
                                );
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_pong = Instant::now();
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        }
    }

    room.disconnect(conn_id).await;
    info!(
        room_id = %room_id,
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "presence connection closed"
    );
}

async fn authenticate(
    verifier: &CollabVerifier,
    token: Option<&str>,
    room_id: &str,
) -> Result<UserIdentity, ErrorCode> {
    let Some(token) = token else {
        return Err(ErrorCode::AuthMissing);
    };

    match verifier.verify(token, room_id).await {
        Ok(identity) => Ok(identity),
        Err(VerifyError::Rejected) => Err(ErrorCode::AuthInvalid),
        Err(VerifyError::Unconfigured) => {
            warn!(room_id = %room_id, "presence handshake failed: no verification endpoint configured");
            Err(ErrorCode::ServerConfigError)
        }
        Err(VerifyError::Unavailable(error)) => {
            warn!(room_id = %room_id, error = ?error, "credential verification failed");
            Err(ErrorCode::ServerInternalError)
        }
    }
}

/// Report a handshake failure, then close. Both sends are best-effort:
/// the socket may already be gone, and that failure stays here.
async fn reject(socket: &mut WebSocket, code: ErrorCode) {
    let _ = send_server_message(socket, &code.to_message()).await;
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: code.close_code(),
            reason: code.default_message().into(),
        })))
        .await;
}

async fn send_server_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let encoded = encode_server_message(message).map_err(|_| ())?;
    socket.send(Message::Text(encoded.into())).await.map_err(|_| ())
}
