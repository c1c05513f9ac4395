use rand::{seq::SliceRandom, Rng};

use crate::board::Board;
use crate::snake::Snake;
use crate::Position;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Apple(Position);

impl Apple {
    pub fn at(pos: Position) -> Self {
        Apple(pos)
    }

    pub fn position(&self) -> Position {
        self.0
    }

    /// Places an apple on a uniformly chosen free interior cell. `None` means
    /// the snake fills the whole board.
    pub fn spawn<R: Rng + ?Sized>(board: &Board, snake: &Snake, rng: &mut R) -> Option<Apple> {
        let choices: Vec<&Position> = board
            .area()
            .iter()
            .filter(|pos| !snake.contains(**pos))
            .collect();
        choices.choose(rng).map(|pos| Apple(**pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn never_spawns_on_the_snake() {
        let board = Board::new(12, 14);
        let snake = Snake::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let apple = Apple::spawn(&board, &snake, &mut rng).unwrap();
            assert!(!snake.contains(apple.position()));
            assert!(board.contains(apple.position()));
        }
    }

    #[test]
    fn picks_the_only_free_cell() {
        let board = Board::new(3, 3);
        let snake = Snake::from_segments([(1, 1), (1, 2), (2, 2)]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(Apple::spawn(&board, &snake, &mut rng), Some(Apple::at((2, 1))));
    }

    #[test]
    fn full_board_has_no_apple() {
        let board = Board::new(3, 2);
        let snake = Snake::from_segments([(1, 1), (2, 1)]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(Apple::spawn(&board, &snake, &mut rng), None);
    }

    #[test]
    fn reaches_every_free_cell() {
        let board = Board::new(4, 4);
        let snake = Snake::from_segments([(1, 1)]);
        let mut rng = StdRng::seed_from_u64(42);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(Apple::spawn(&board, &snake, &mut rng).unwrap().position());
        }
        assert_eq!(seen.len(), board.area().len() - 1);
    }
}
