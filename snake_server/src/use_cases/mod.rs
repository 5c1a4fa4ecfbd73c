// Use cases layer: application workflows for the game server.

pub mod game;
pub mod lobby;
pub mod types;

pub use lobby::{JoinedMatch, MatchError, MatchHandle, MatchRegistry, MatchSettings};
pub use types::{EndReason, MatchEvent};
