use crate::domain::MatchPhase;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::GameStateDto;
use crate::interface_adapters::state::AppState;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, serde::Serialize)]
pub struct RoomStatusResponse {
    pub room: String,
    // waiting | running | ended
    pub phase: &'static str,
    pub players: usize,
    pub state: GameStateDto,
}

/// Read-only view of an active match, for operators and tests.
pub async fn room_status_handler(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let Some(handle) = state.registry.get_match(code.trim()).await else {
        return error_response(StatusCode::NOT_FOUND, "room not found");
    };

    // Snapshot under the room lock like the runner does.
    let room = handle.room.lock().await;
    let response = RoomStatusResponse {
        room: room.code().to_string(),
        phase: phase_name(room.phase()),
        players: room.player_count(),
        state: room.snapshot(Instant::now()).into(),
    };
    drop(room);

    (StatusCode::OK, Json(response)).into_response()
}

fn phase_name(phase: MatchPhase) -> &'static str {
    match phase {
        MatchPhase::Waiting => "waiting",
        MatchPhase::Running => "running",
        MatchPhase::Ended => "ended",
    }
}
