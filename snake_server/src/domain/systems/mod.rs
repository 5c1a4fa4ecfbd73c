// Per-tick rules that operate across all entities of a match.

pub mod collision;
pub mod food;
