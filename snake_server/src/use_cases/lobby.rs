// Match registry: creating, joining and tearing down two-player rooms.

use crate::domain::{BoardSize, ConnId, Direction, EntityId, JoinError, MatchPhase, Room};
use crate::use_cases::MatchEvent;
use crate::use_cases::game::match_task;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock, broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info};

/// Shared configuration for every match the registry creates.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Board dimensions (toroidal).
    pub board: BoardSize,
    /// Fixed tick interval for the match runner.
    pub tick_interval: Duration,
    /// Total running time of a match.
    pub match_duration: Duration,
    /// Capacity for per-match event broadcasts.
    pub event_broadcast_capacity: usize,
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// A match with this code is already active.
    AlreadyExists,
    /// No active match has this code.
    NotFound,
    /// Both player slots are taken.
    Full,
    /// The match is over and accepts no new players.
    Ended,
}

impl From<JoinError> for MatchError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::Full => MatchError::Full,
            JoinError::Ended => MatchError::Ended,
        }
    }
}

/// Per-match state and channels.
#[derive(Clone)]
pub struct MatchHandle {
    /// Code clients use to target this match.
    pub code: Arc<str>,
    /// The simulation itself; every read and write goes through this lock.
    pub room: Arc<Mutex<Room>>,
    /// Broadcast sender for match events (start, snapshots, end).
    pub events_tx: broadcast::Sender<MatchEvent>,
    /// Watch sender for the lifecycle phase.
    pub phase_tx: watch::Sender<MatchPhase>,
    /// Wakes the runner when the match is cut short.
    shutdown: Arc<Notify>,
}

impl MatchHandle {
    pub fn phase(&self) -> MatchPhase {
        *self.phase_tx.borrow()
    }
}

/// Result of a successful create or join.
pub struct JoinedMatch {
    pub handle: MatchHandle,
    pub entity_id: EntityId,
    pub name: String,
    /// Subscribed before the join took effect, so the start event is never missed.
    pub events_rx: broadcast::Receiver<MatchEvent>,
}

/// Thread-safe registry for active matches.
pub struct MatchRegistry {
    /// Settings applied to newly created matches.
    settings: MatchSettings,
    /// Map of match code to active handle.
    matches: RwLock<HashMap<String, MatchHandle>>,
}

impl MatchRegistry {
    /// Creates a new registry with the provided settings.
    pub fn new(settings: MatchSettings) -> Self {
        Self {
            settings,
            matches: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a match under `code` with the caller as player 1.
    ///
    /// The match is removed from the registry automatically once it ends.
    pub async fn create_match(
        self: &Arc<Self>,
        code: String,
        conn_id: ConnId,
        name: String,
    ) -> Result<JoinedMatch, MatchError> {
        let mut matches = self.matches.write().await;
        if matches.contains_key(&code) {
            return Err(MatchError::AlreadyExists);
        }

        let seed: u64 = rand::rng().random();
        let mut room = Room::new(
            code.clone(),
            self.settings.board,
            self.settings.match_duration,
            seed,
        );
        let snake = room.add_player(conn_id, name)?;
        let (entity_id, name) = (snake.id, snake.name.clone());

        let (events_tx, events_rx) =
            broadcast::channel::<MatchEvent>(self.settings.event_broadcast_capacity);
        let (phase_tx, phase_rx) = watch::channel(MatchPhase::Waiting);

        let handle = MatchHandle {
            code: Arc::from(code.as_str()),
            room: Arc::new(Mutex::new(room)),
            events_tx,
            phase_tx,
            shutdown: Arc::new(Notify::new()),
        };
        matches.insert(code, handle.clone());
        drop(matches);

        self.clone()
            .spawn_match_end_watcher(handle.code.clone(), phase_rx);
        info!(room = %handle.code, conn_id, entity_id, "match created");

        Ok(JoinedMatch {
            handle,
            entity_id,
            name,
            events_rx,
        })
    }

    /// Adds the caller as player 2 and starts the runner once the room is full.
    pub async fn join_match(
        &self,
        code: &str,
        conn_id: ConnId,
        name: String,
    ) -> Result<JoinedMatch, MatchError> {
        let handle = self.get_match(code).await.ok_or(MatchError::NotFound)?;

        let mut room = handle.room.lock().await;
        let snake = room.add_player(conn_id, name)?;
        let (entity_id, name) = (snake.id, snake.name.clone());
        let events_rx = handle.events_tx.subscribe();
        info!(room = %handle.code, conn_id, entity_id, "player joined");

        if room.start(Instant::now()) {
            let _ = handle.events_tx.send(MatchEvent::Started);
            handle.phase_tx.send_replace(MatchPhase::Running);

            // Spawn the authoritative tick loop for this match.
            tokio::spawn(match_task(
                handle.room.clone(),
                handle.events_tx.clone(),
                handle.phase_tx.clone(),
                self.settings.tick_interval,
                handle.shutdown.clone(),
            ));
            info!(room = %handle.code, "match started");
        }
        drop(room);

        Ok(JoinedMatch {
            handle,
            entity_id,
            name,
            events_rx,
        })
    }

    /// Applies a direction request for a player of `code`. Returns false when ignored.
    pub async fn change_direction(
        &self,
        code: &str,
        conn_id: ConnId,
        direction: Direction,
    ) -> bool {
        let Some(handle) = self.get_match(code).await else {
            return false;
        };
        let mut room = handle.room.lock().await;
        room.change_direction(conn_id, direction)
    }

    /// Removes a disconnected player and ends the match.
    ///
    /// Returns false if the player was not in an active match under `code`.
    pub async fn leave_match(&self, code: &str, conn_id: ConnId) -> bool {
        let Some(handle) = self.get_match(code).await else {
            return false;
        };

        let mut room = handle.room.lock().await;
        let Some(snake) = room.remove_player(conn_id) else {
            return false;
        };
        let result = room.result();
        info!(
            room = %handle.code,
            conn_id,
            entity_id = snake.id,
            ?result,
            "player left; match ended"
        );

        // Published under the room lock so the runner can never follow it with a snapshot.
        let _ = handle.events_tx.send(MatchEvent::PlayerLeft { result });
        handle.phase_tx.send_replace(MatchPhase::Ended);
        handle.shutdown.notify_one();
        true
    }

    /// Returns a match handle for the provided code, if it exists.
    pub async fn get_match(&self, code: &str) -> Option<MatchHandle> {
        let matches = self.matches.read().await;
        matches.get(code).cloned()
    }

    /// True while the match exists and has not ended.
    pub async fn is_active(&self, code: &str) -> bool {
        self.get_match(code)
            .await
            .is_some_and(|handle| handle.phase() != MatchPhase::Ended)
    }

    pub async fn active_matches(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn remove_match(&self, code: &str) -> Option<MatchHandle> {
        self.matches.write().await.remove(code)
    }

    /// Removes the match from the registry once its phase reaches `Ended`.
    pub fn spawn_match_end_watcher(
        self: Arc<Self>,
        code: Arc<str>,
        mut phase_rx: watch::Receiver<MatchPhase>,
    ) {
        tokio::spawn(async move {
            loop {
                if *phase_rx.borrow_and_update() == MatchPhase::Ended {
                    break;
                }
                if phase_rx.changed().await.is_err() {
                    break;
                }
            }
            if self.remove_match(&code).await.is_some() {
                debug!(room = %code, "ended match removed from registry");
            }
        });
    }
}
