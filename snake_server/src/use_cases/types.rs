// Use-case level outputs of a running match.

use crate::domain::{EntityId, MatchResult, MatchSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    Collision { dead: EntityId },
}

#[derive(Debug, Clone)]
pub enum MatchEvent {
    // Second player arrived; the runner is ticking.
    Started,
    // State after a fully completed tick.
    Update(MatchSnapshot),
    // Normal end of a match. `snapshot.time_left` is always zero.
    GameOver {
        snapshot: MatchSnapshot,
        result: MatchResult,
        reason: EndReason,
    },
    // A player disconnected and the match was cut short.
    PlayerLeft { result: MatchResult },
}
