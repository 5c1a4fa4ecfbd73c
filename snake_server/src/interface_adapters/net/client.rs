use crate::interface_adapters::protocol::{
    ClientMessage, CreateRoomPayload, JOIN_REJECTED_MESSAGE, JoinRoomPayload, SeatDto,
    ServerMessage,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::{rand_id, room_code};
use crate::use_cases::{JoinedMatch, MatchError, MatchEvent, MatchRegistry};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_NAME_CHARS: usize = 24;
const DEFAULT_NAME: &str = "Player";
// Fresh codes to try before giving up on create_room.
const ROOM_CODE_ATTEMPTS: usize = 16;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| {
        // Connection id doubles as the player identity inside a match.
        let conn_id = rand_id();
        let span = info_span!("conn", conn_id, room = tracing::field::Empty);
        handle_socket(socket, conn_id, registry).instrument(span)
    })
}

struct ConnCtx {
    conn_id: u64,
    registry: Arc<MatchRegistry>,
    // Code of the match this connection plays in, if any.
    room: Option<Arc<str>>,
    // Events of that match; `None` while not seated.
    events_rx: Option<broadcast::Receiver<MatchEvent>>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,

    last_invalid_input_log: Instant,
    last_lag_log: Instant,

    close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new(conn_id: u64, registry: Arc<MatchRegistry>) -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            conn_id,
            registry,
            room: None,
            events_rx: None,
            msgs_in: 0,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            invalid_json: 0,
            last_invalid_input_log: now,
            last_lag_log: now,
            close_frame: None,
        }
    }

    fn seat(&mut self, joined: JoinedMatch) -> SeatDto {
        tracing::Span::current().record("room", &*joined.handle.code);
        self.room = Some(joined.handle.code.clone());
        self.events_rx = Some(joined.events_rx);
        SeatDto {
            room: joined.handle.code.to_string(),
            snake_id: joined.entity_id,
            name: joined.name,
        }
    }

    fn unseat(&mut self) {
        self.room = None;
        self.events_rx = None;
    }

    // A connection plays in at most one live match at a time.
    async fn seated_in_active_match(&self) -> bool {
        match &self.room {
            Some(code) => self.registry.is_active(code).await,
            None => false,
        }
    }
}

async fn handle_socket(mut socket: WebSocket, conn_id: u64, registry: Arc<MatchRegistry>) {
    info!("client connected");
    let mut ctx = ConnCtx::new(conn_id, registry);

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    disconnect_cleanup(&mut ctx).await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn reply(
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    msg: &ServerMessage,
) -> Result<LoopControl, NetError> {
    let bytes = send_message(socket, msg).await?;
    ctx.msgs_out += 1;
    ctx.bytes_out += bytes as u64;
    Ok(LoopControl::Continue)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn display_name(requested: Option<String>) -> String {
    let name = requested.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return DEFAULT_NAME.to_string();
    }
    name.chars().take(MAX_NAME_CHARS).collect()
}

// Resolves when the seated match publishes an event; never resolves while unseated.
async fn next_match_event(
    events_rx: &mut Option<broadcast::Receiver<MatchEvent>>,
) -> Result<MatchEvent, broadcast::error::RecvError> {
    match events_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(socket, incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing Match Event
            event = next_match_event(&mut ctx.events_rx) => {
                match event {
                    Ok(event) => {
                        let terminal = matches!(
                            event,
                            MatchEvent::GameOver { .. } | MatchEvent::PlayerLeft { .. }
                        );
                        let msg = ServerMessage::from(event);
                        let outcome = reply(socket, ctx, &msg).await;
                        if terminal {
                            // The match is over; the client may create or join another.
                            ctx.unseat();
                        }
                        match outcome {
                            Ok(_) => false,
                            Err(e) => {
                                warn!(error = ?e, "failed to send match event");
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Snapshots are full state; skipping stale ones is harmless.
                        if should_log(&mut ctx.last_lag_log) {
                            warn!(missed = n, "match events lagged; skipping to latest");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("match event channel closed");
                        ctx.unseat();
                        false
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::CreateRoom(payload)) => {
                        handle_create_room(socket, ctx, payload).await
                    }
                    Ok(ClientMessage::JoinRoom(payload)) => {
                        handle_join_room(socket, ctx, payload).await
                    }
                    Ok(ClientMessage::ChangeDirection(payload)) => {
                        let applied = ctx
                            .registry
                            .change_direction(&payload.room, ctx.conn_id, payload.direction.into())
                            .await;
                        if !applied && should_log(&mut ctx.last_invalid_input_log) {
                            debug!(
                                room = %payload.room,
                                direction = ?payload.direction,
                                "direction change ignored"
                            );
                        }
                        Ok(LoopControl::Continue)
                    }
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn handle_create_room(
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    payload: CreateRoomPayload,
) -> Result<LoopControl, NetError> {
    if ctx.seated_in_active_match().await {
        return reply(socket, ctx, &already_seated()).await;
    }

    let name = display_name(payload.name);
    for _ in 0..ROOM_CODE_ATTEMPTS {
        match ctx
            .registry
            .create_match(room_code(), ctx.conn_id, name.clone())
            .await
        {
            Ok(joined) => {
                let seat = ctx.seat(joined);
                return reply(socket, ctx, &ServerMessage::RoomCreated(seat)).await;
            }
            Err(MatchError::AlreadyExists) => continue,
            Err(e) => {
                warn!(error = ?e, "create room failed");
                break;
            }
        }
    }

    let msg = ServerMessage::Error {
        message: "Could not create a room".to_string(),
    };
    reply(socket, ctx, &msg).await
}

async fn handle_join_room(
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    payload: JoinRoomPayload,
) -> Result<LoopControl, NetError> {
    if ctx.seated_in_active_match().await {
        return reply(socket, ctx, &already_seated()).await;
    }

    let code = payload.room.trim();
    match ctx
        .registry
        .join_match(code, ctx.conn_id, display_name(payload.name))
        .await
    {
        Ok(joined) => {
            let seat = ctx.seat(joined);
            reply(socket, ctx, &ServerMessage::RoomJoined(seat)).await
        }
        Err(e) => {
            info!(room = %code, error = ?e, "join rejected");
            let msg = ServerMessage::Error {
                message: JOIN_REJECTED_MESSAGE.to_string(),
            };
            reply(socket, ctx, &msg).await
        }
    }
}

fn already_seated() -> ServerMessage {
    ServerMessage::Error {
        message: "Already in a room".to_string(),
    }
}

async fn disconnect_cleanup(ctx: &mut ConnCtx) {
    if let Some(code) = ctx.room.take() {
        // Ends the match for the opponent; no-op if it already finished.
        if ctx.registry.leave_match(&code, ctx.conn_id).await {
            info!(room = %code, "left match on disconnect");
        }
    }
    ctx.events_rx = None;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        "connection stats"
    );
    info!("client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_missing_names_fall_back_to_default() {
        assert_eq!(display_name(None), DEFAULT_NAME);
        assert_eq!(display_name(Some("   ".to_string())), DEFAULT_NAME);
        assert_eq!(display_name(Some("  ana ".to_string())), "ana");
    }

    #[test]
    fn long_names_are_truncated() {
        let name = display_name(Some("x".repeat(100)));
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
    }
}
