// Domain layer: core simulation types and rules.

pub mod room;
pub mod state;
pub mod systems;

pub use room::{ConnId, JoinError, MatchPhase, MatchResult, Room};
pub use state::{BoardSize, Direction, EntityId, MatchSnapshot, Position, Snake};
