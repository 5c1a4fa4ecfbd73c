use super::types::{EndReason, MatchEvent};
use crate::domain::{MatchPhase, Room};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info};

/// Drives one running match at a fixed tick rate until it ends.
///
/// Every iteration waits one tick, then under the room lock either ends the match on time-out,
/// or runs a tick and ends it on a death, or publishes the new snapshot. Events are sent while
/// the lock is held so nothing can be published after another path ended the match.
pub async fn match_task(
    room: Arc<Mutex<Room>>,
    events_tx: broadcast::Sender<MatchEvent>,
    phase_tx: watch::Sender<MatchPhase>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    // First tick fires one interval after start, not immediately.
    let mut interval = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!(tick, "match runner cancelled");
                break;
            }
            _ = interval.tick() => {}
        }

        let mut guard = room.lock().await;
        if guard.phase() != MatchPhase::Running {
            // Ended elsewhere (disconnect); that path already notified clients.
            break;
        }

        let now = Instant::now();
        if guard.is_expired(now) {
            finish(&mut guard, EndReason::TimeUp, now, &events_tx, &phase_tx);
            break;
        }

        tick += 1;
        if let Some(dead) = guard.tick() {
            finish(&mut guard, EndReason::Collision { dead }, now, &events_tx, &phase_tx);
            break;
        }

        let _ = events_tx.send(MatchEvent::Update(guard.snapshot(now)));
    }
}

fn finish(
    room: &mut Room,
    reason: EndReason,
    now: Instant,
    events_tx: &broadcast::Sender<MatchEvent>,
    phase_tx: &watch::Sender<MatchPhase>,
) {
    if !room.end() {
        return;
    }

    let mut snapshot = room.snapshot(now);
    snapshot.time_left = Duration::ZERO;
    let result = room.result();
    info!(room = %room.code(), ?reason, ?result, "match ended");

    let _ = events_tx.send(MatchEvent::GameOver {
        snapshot,
        result,
        reason,
    });
    phase_tx.send_replace(MatchPhase::Ended);
}
