// A single two-player match: entities, food, clock and lifecycle phase.

use crate::domain::state::{BoardSize, Direction, EntityId, MatchSnapshot, Position, Snake};
use crate::domain::systems::{collision, food};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Identity of the network connection that owns a snake.
pub type ConnId = u64;

pub const MAX_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Waiting,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    Full,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Winner { id: EntityId, name: String },
    Tie,
    NoPlayers,
}

pub struct Room {
    code: String,
    board: BoardSize,
    duration: Duration,
    // Join order doubles as collision priority.
    players: Vec<(ConnId, Snake)>,
    food: Position,
    started_at: Option<Instant>,
    phase: MatchPhase,
    rng: StdRng,
}

impl Room {
    pub fn new(code: String, board: BoardSize, duration: Duration, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        // Nobody is on the board yet, so there is always a free cell.
        let food = food::place_food(&mut rng, board, &[]).unwrap_or(Position::new(0, 0));
        debug!(room = %code, seed, "room initialized");
        Self {
            code,
            board,
            duration,
            players: Vec::with_capacity(MAX_PLAYERS),
            food,
            started_at: None,
            phase: MatchPhase::Waiting,
            rng,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn food(&self) -> Position {
        self.food
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn contains(&self, conn_id: ConnId) -> bool {
        self.players.iter().any(|(c, _)| *c == conn_id)
    }

    pub fn snake(&self, id: EntityId) -> Option<&Snake> {
        self.players.iter().map(|(_, s)| s).find(|s| s.id == id)
    }

    pub fn add_player(&mut self, conn_id: ConnId, name: String) -> Result<&Snake, JoinError> {
        if self.phase == MatchPhase::Ended {
            return Err(JoinError::Ended);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(JoinError::Full);
        }

        let id = self.players.len() as EntityId + 1;
        let (start, direction) = spawn_point(self.board, id);
        self.players.push((conn_id, Snake::new(id, name, start, direction)));
        // Food was placed before anyone spawned.
        if start == self.food {
            self.respawn_food();
        }
        let (_, snake) = &self.players[self.players.len() - 1];
        Ok(snake)
    }

    /// Moves a full room from waiting to running and stamps the start time.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.phase != MatchPhase::Waiting || self.players.len() != MAX_PLAYERS {
            return false;
        }
        self.phase = MatchPhase::Running;
        self.started_at = Some(now);
        true
    }

    /// Removes a player and ends the match. Ended rooms are left untouched.
    pub fn remove_player(&mut self, conn_id: ConnId) -> Option<Snake> {
        if self.phase == MatchPhase::Ended {
            return None;
        }
        let idx = self.players.iter().position(|(c, _)| *c == conn_id)?;
        let (_, snake) = self.players.remove(idx);
        self.phase = MatchPhase::Ended;
        Some(snake)
    }

    pub fn change_direction(&mut self, conn_id: ConnId, direction: Direction) -> bool {
        if self.phase == MatchPhase::Ended {
            return false;
        }
        self.players
            .iter_mut()
            .find(|(c, _)| *c == conn_id)
            .is_some_and(|(_, snake)| snake.steer(direction))
    }

    /// Returns true if this call performed the transition to `Ended`.
    pub fn end(&mut self) -> bool {
        if self.phase == MatchPhase::Ended {
            return false;
        }
        self.phase = MatchPhase::Ended;
        true
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.started_at
            .is_some_and(|started| now.saturating_duration_since(started) >= self.duration)
    }

    pub fn time_left(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started) => self
                .duration
                .saturating_sub(now.saturating_duration_since(started)),
            None => self.duration,
        }
    }

    /// Runs one simulation step: move, eat, then collide.
    ///
    /// Returns the id of the snake that died this tick, if any. Does nothing unless running.
    pub fn tick(&mut self) -> Option<EntityId> {
        if self.phase != MatchPhase::Running {
            return None;
        }

        let board = self.board;
        for (_, snake) in &mut self.players {
            snake.advance(board);
        }

        let mut eaten = false;
        for (_, snake) in &mut self.players {
            if snake.alive && snake.head() == self.food {
                snake.feed();
                eaten = true;
            }
        }
        if eaten {
            self.respawn_food();
        }

        let mut snakes: Vec<&mut Snake> = self.players.iter_mut().map(|(_, s)| s).collect();
        collision::resolve_collisions(&mut snakes)
    }

    pub fn snapshot(&self, now: Instant) -> MatchSnapshot {
        let snakes = self.players.iter().map(|(_, s)| s);
        MatchSnapshot {
            snakes: snakes
                .clone()
                .map(|s| (s.id, s.body.iter().copied().collect()))
                .collect(),
            food: self.food,
            points: snakes.clone().map(|s| (s.id, s.score)).collect(),
            names: snakes.map(|s| (s.id, s.name.clone())).collect(),
            time_left: self.time_left(now),
        }
    }

    /// Decides the match from the players still present.
    pub fn result(&self) -> MatchResult {
        match self.players.as_slice() {
            [] => MatchResult::NoPlayers,
            [(_, only)] => winner(only),
            [(_, a), (_, b), ..] => match (a.alive, b.alive) {
                (true, false) => winner(a),
                (false, true) => winner(b),
                _ if a.score > b.score => winner(a),
                _ if b.score > a.score => winner(b),
                _ => MatchResult::Tie,
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn place_food_at(&mut self, pos: Position) {
        self.food = pos;
    }

    fn respawn_food(&mut self) {
        let snakes: Vec<&Snake> = self.players.iter().map(|(_, s)| s).collect();
        match food::place_food(&mut self.rng, self.board, &snakes) {
            Some(pos) => self.food = pos,
            None => warn!(room = %self.code, "no free cell for food; keeping previous position"),
        }
    }
}

fn winner(snake: &Snake) -> MatchResult {
    MatchResult::Winner {
        id: snake.id,
        name: snake.name.clone(),
    }
}

// Player 1 starts on the left heading right, player 2 on the right heading left.
// On narrow boards where both land on one cell, player 2 moves half a row away.
fn spawn_point(board: BoardSize, id: EntityId) -> (Position, Direction) {
    let mid = board.height as i32 / 2;
    let first = board.wrap(5, mid);
    if id == 1 {
        return (first, Direction::Right);
    }
    let second = board.wrap(board.width as i32 - 6, mid);
    if second == first {
        let shifted = board.wrap(first.x + board.width as i32 / 2, mid);
        return (shifted, Direction::Left);
    }
    (second, Direction::Left)
}
