use crate::domain::state::{BoardSize, Position, Snake};
use rand::Rng;
use rand::prelude::IndexedRandom;

// Random probes per board cell before falling back to a full scan.
const PROBES_PER_CELL: usize = 4;

/// Picks a uniformly random cell that no living snake occupies.
///
/// Random probing is capped at a few probes per cell; past that the free cells are enumerated
/// and one is chosen. Returns `None` only when every cell is covered.
pub fn place_food<R: Rng>(
    rng: &mut R,
    board: BoardSize,
    snakes: &[&Snake],
) -> Option<Position> {
    let is_free = |pos: Position| !snakes.iter().any(|s| s.alive && s.occupies(pos));

    for _ in 0..board.cells() * PROBES_PER_CELL {
        let candidate = Position::new(
            rng.random_range(0..board.width) as i32,
            rng.random_range(0..board.height) as i32,
        );
        if is_free(candidate) {
            return Some(candidate);
        }
    }

    let free: Vec<Position> = (0..board.height as i32)
        .flat_map(|y| (0..board.width as i32).map(move |x| Position::new(x, y)))
        .filter(|p| is_free(*p))
        .collect();
    free.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Direction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;

    fn snake_covering(cells: Vec<Position>) -> Snake {
        let mut snake = Snake::new(1, "p1".to_string(), cells[0], Direction::Right);
        snake.body = VecDeque::from(cells);
        snake
    }

    #[test]
    fn food_is_always_inside_the_board_and_off_living_snakes() {
        let board = BoardSize::new(4, 3);
        let snake = snake_covering(vec![
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(3, 0),
            Position::new(3, 1),
        ]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let food = place_food(&mut rng, board, &[&snake]).expect("free cells remain");
            assert!((0..4).contains(&food.x));
            assert!((0..3).contains(&food.y));
            assert!(!snake.occupies(food));
        }
    }

    #[test]
    fn finds_the_last_free_cell() {
        let board = BoardSize::new(2, 2);
        let snake = snake_covering(vec![
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(1, 1),
        ]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            place_food(&mut rng, board, &[&snake]),
            Some(Position::new(0, 1))
        );
    }

    #[test]
    fn full_board_yields_none() {
        let board = BoardSize::new(2, 1);
        let snake = snake_covering(vec![Position::new(0, 0), Position::new(1, 0)]);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(place_food(&mut rng, board, &[&snake]), None);
    }

    #[test]
    fn dead_snakes_do_not_block_placement() {
        let board = BoardSize::new(2, 1);
        let mut snake = snake_covering(vec![Position::new(0, 0), Position::new(1, 0)]);
        snake.alive = false;
        let mut rng = StdRng::seed_from_u64(3);

        assert!(place_food(&mut rng, board, &[&snake]).is_some());
    }
}
