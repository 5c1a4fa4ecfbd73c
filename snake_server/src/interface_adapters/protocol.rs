// Wire protocol DTOs and conversions for public game server messages.

use crate::domain::{Direction, EntityId, MatchResult, MatchSnapshot, Position};
use crate::use_cases::MatchEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TIE_MARKER: &str = "Tie";
pub const DISCONNECT_MESSAGE: &str = "Player disconnected";
pub const JOIN_REJECTED_MESSAGE: &str = "Room not found or full";

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    // Reply to create_room; the sender is player 1.
    RoomCreated(SeatDto),
    // Reply to join_room; the sender is player 2.
    RoomJoined(SeatDto),
    Error { message: String },
    // Both players present, ticks are running.
    StartGame,
    GameUpdate(GameStateDto),
    GameOver(GameOverDto),
    // Match cut short by a disconnect. Not a regular game over.
    PlayerDisconnected {
        message: String,
        winner: Option<String>,
    },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom(CreateRoomPayload),
    JoinRoom(JoinRoomPayload),
    ChangeDirection(ChangeDirectionPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomPayload {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomPayload {
    pub room: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDirectionPayload {
    pub room: String,
    pub direction: DirectionDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectionDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<DirectionDto> for Direction {
    fn from(direction: DirectionDto) -> Self {
        match direction {
            DirectionDto::Up => Direction::Up,
            DirectionDto::Down => Direction::Down,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

/// The caller's seat in a match.
#[derive(Debug, Clone, Serialize)]
pub struct SeatDto {
    pub room: String,
    pub snake_id: EntityId,
    pub name: String,
}

/// Full visible match state, keyed by snake id.
#[derive(Debug, Clone, Serialize)]
pub struct GameStateDto {
    pub snakes: BTreeMap<EntityId, Vec<(i32, i32)>>,
    pub food: (i32, i32),
    pub points: BTreeMap<EntityId, u32>,
    // Seconds, fractional.
    pub time_left: f64,
    pub names: BTreeMap<EntityId, String>,
}

impl From<MatchSnapshot> for GameStateDto {
    fn from(snapshot: MatchSnapshot) -> Self {
        Self {
            snakes: snapshot
                .snakes
                .into_iter()
                .map(|(id, body)| (id, body.into_iter().map(cell).collect()))
                .collect(),
            food: cell(snapshot.food),
            points: snapshot.points,
            time_left: snapshot.time_left.as_secs_f64(),
            names: snapshot.names,
        }
    }
}

/// Final state plus the winner's display name (or the tie marker).
#[derive(Debug, Clone, Serialize)]
pub struct GameOverDto {
    pub snakes: BTreeMap<EntityId, Vec<(i32, i32)>>,
    pub food: (i32, i32),
    pub points: BTreeMap<EntityId, u32>,
    pub time_left: f64,
    pub names: BTreeMap<EntityId, String>,
    pub winner: String,
}

impl GameOverDto {
    pub fn new(snapshot: MatchSnapshot, result: MatchResult) -> Self {
        let state = GameStateDto::from(snapshot);
        Self {
            snakes: state.snakes,
            food: state.food,
            points: state.points,
            time_left: 0.0,
            names: state.names,
            winner: winner_name(result).unwrap_or_else(|| TIE_MARKER.to_string()),
        }
    }
}

impl From<MatchEvent> for ServerMessage {
    fn from(event: MatchEvent) -> Self {
        match event {
            MatchEvent::Started => ServerMessage::StartGame,
            MatchEvent::Update(snapshot) => ServerMessage::GameUpdate(snapshot.into()),
            MatchEvent::GameOver {
                snapshot, result, ..
            } => ServerMessage::GameOver(GameOverDto::new(snapshot, result)),
            MatchEvent::PlayerLeft { result } => ServerMessage::PlayerDisconnected {
                message: DISCONNECT_MESSAGE.to_string(),
                winner: winner_name(result),
            },
        }
    }
}

fn winner_name(result: MatchResult) -> Option<String> {
    match result {
        MatchResult::Winner { name, .. } => Some(name),
        MatchResult::Tie | MatchResult::NoPlayers => None,
    }
}

fn cell(pos: Position) -> (i32, i32) {
    (pos.x, pos.y)
}
