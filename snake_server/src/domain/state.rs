// Domain-level grid, entity and snapshot types.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// Player slot number, assigned by join order (1 or 2).
pub type EntityId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// One cell in `direction`, wrapped onto the torus.
    pub fn step(self, direction: Direction, board: BoardSize) -> Self {
        let (dx, dy) = direction.offset();
        board.wrap(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSize {
    pub width: u32,
    pub height: u32,
}

impl BoardSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn cells(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn wrap(self, x: i32, y: i32) -> Position {
        Position {
            x: x.rem_euclid(self.width as i32),
            y: y.rem_euclid(self.height as i32),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    // Screen coordinates: y grows downwards.
    fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snake {
    pub id: EntityId,
    pub name: String,
    // Head is the front element.
    pub body: VecDeque<Position>,
    pub direction: Direction,
    pub growth_pending: u32,
    pub score: u32,
    pub alive: bool,
}

impl Snake {
    pub fn new(id: EntityId, name: String, start: Position, direction: Direction) -> Self {
        Self {
            id,
            name,
            body: VecDeque::from([start]),
            direction,
            growth_pending: 0,
            score: 0,
            alive: true,
        }
    }

    pub fn head(&self) -> Position {
        // Body is never empty: it starts with one cell and every move pushes before popping.
        self.body[0]
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Advances the snake one cell. Dead snakes stay where they died.
    pub fn advance(&mut self, board: BoardSize) {
        if !self.alive {
            return;
        }

        let next = self.head().step(self.direction, board);
        self.body.push_front(next);
        if self.growth_pending > 0 {
            self.growth_pending -= 1;
        } else {
            self.body.pop_back();
        }
    }

    /// Applies a requested heading unless it would reverse onto the neck.
    /// Returns false when the request was ignored.
    pub fn steer(&mut self, requested: Direction) -> bool {
        if requested == self.direction.opposite() {
            return false;
        }
        self.direction = requested;
        true
    }

    /// Credits one food item: one point now, one extra segment on the next move.
    pub fn feed(&mut self) {
        self.growth_pending += 1;
        self.score += 1;
    }

    pub fn bites_itself(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|p| *p == head)
    }
}

/// Point-in-time view of a match, keyed by entity id.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSnapshot {
    pub snakes: BTreeMap<EntityId, Vec<Position>>,
    pub food: Position,
    pub points: BTreeMap<EntityId, u32>,
    pub names: BTreeMap<EntityId, String>,
    pub time_left: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: BoardSize = BoardSize::new(10, 8);

    fn snake_at(x: i32, y: i32, direction: Direction) -> Snake {
        Snake::new(1, "p1".to_string(), Position::new(x, y), direction)
    }

    #[test]
    fn moving_off_each_edge_wraps_to_the_opposite_edge() {
        let cases = [
            (Position::new(4, 0), Direction::Up, Position::new(4, 7)),
            (Position::new(4, 7), Direction::Down, Position::new(4, 0)),
            (Position::new(0, 3), Direction::Left, Position::new(9, 3)),
            (Position::new(9, 3), Direction::Right, Position::new(0, 3)),
            (Position::new(0, 0), Direction::Up, Position::new(0, 7)),
            (Position::new(0, 0), Direction::Left, Position::new(9, 0)),
            (Position::new(9, 7), Direction::Down, Position::new(9, 0)),
            (Position::new(9, 7), Direction::Right, Position::new(0, 7)),
        ];

        for (start, direction, expected) in cases {
            let mut snake = snake_at(start.x, start.y, direction);
            snake.advance(BOARD);
            assert_eq!(snake.head(), expected, "{start:?} moving {direction:?}");
            assert_eq!(snake.body.len(), 1);
        }
    }

    #[test]
    fn interior_moves_do_not_wrap() {
        let mut snake = snake_at(4, 4, Direction::Right);
        snake.advance(BOARD);
        assert_eq!(snake.head(), Position::new(5, 4));
        snake.direction = Direction::Down;
        snake.advance(BOARD);
        assert_eq!(snake.head(), Position::new(5, 5));
    }

    #[test]
    fn pending_growth_keeps_the_tail_for_one_move() {
        let mut snake = snake_at(2, 2, Direction::Right);
        snake.feed();
        assert_eq!(snake.score, 1);
        assert_eq!(snake.body.len(), 1);

        snake.advance(BOARD);
        assert_eq!(snake.body.len(), 2);
        assert_eq!(snake.growth_pending, 0);
        assert_eq!(
            snake.body.iter().copied().collect::<Vec<_>>(),
            vec![Position::new(3, 2), Position::new(2, 2)]
        );

        snake.advance(BOARD);
        assert_eq!(snake.body.len(), 2);
        assert_eq!(snake.head(), Position::new(4, 2));
    }

    #[test]
    fn reversal_is_rejected_and_other_turns_are_accepted() {
        let mut snake = snake_at(2, 2, Direction::Right);

        assert!(!snake.steer(Direction::Left));
        assert_eq!(snake.direction, Direction::Right);

        assert!(snake.steer(Direction::Right));
        assert_eq!(snake.direction, Direction::Right);

        assert!(snake.steer(Direction::Up));
        assert_eq!(snake.direction, Direction::Up);

        assert!(!snake.steer(Direction::Down));
        assert_eq!(snake.direction, Direction::Up);
    }

    #[test]
    fn dead_snake_does_not_move() {
        let mut snake = snake_at(2, 2, Direction::Right);
        snake.alive = false;
        snake.advance(BOARD);
        snake.advance(BOARD);
        assert_eq!(snake.head(), Position::new(2, 2));
    }

    #[test]
    fn detects_head_on_own_body() {
        let mut snake = snake_at(2, 2, Direction::Right);
        snake.body = VecDeque::from([
            Position::new(2, 2),
            Position::new(3, 2),
            Position::new(3, 3),
            Position::new(2, 3),
            Position::new(2, 2),
        ]);
        assert!(snake.bites_itself());

        snake.body.pop_back();
        assert!(!snake.bites_itself());
    }
}
