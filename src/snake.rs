use std::collections::VecDeque;

use crate::apple::Apple;
use crate::board::Board;
use crate::Position;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Right,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn head_char(self) -> char {
        match self {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}

/// Body segments from head (front) to tail (back).
#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Position>,
    grow_pending: bool,
}

impl Snake {
    pub const INITIAL_HEAD: Position = (9, 7);
    pub const INITIAL_LENGTH: usize = 5;

    /// Vertical snake with its head at (9, 7) and the tail trailing downwards.
    pub fn new() -> Self {
        let (x, y) = Self::INITIAL_HEAD;
        let body = (0..Self::INITIAL_LENGTH as i16).map(|i| (x, y + i)).collect();
        Snake { body, grow_pending: false }
    }

    #[cfg(test)]
    pub fn from_segments(segments: impl IntoIterator<Item = Position>) -> Self {
        let body: VecDeque<Position> = segments.into_iter().collect();
        assert!(!body.is_empty(), "a snake needs at least one segment");
        Snake { body, grow_pending: false }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    pub fn next_head_position(&self, direction: Direction) -> Position {
        let (x, y) = self.head();
        match direction {
            Up => (x, y - 1),
            Left => (x - 1, y),
            Right => (x + 1, y),
            Down => (x, y + 1),
        }
    }

    pub fn can_move(&self, board: &Board, direction: Direction) -> bool {
        let next = self.next_head_position(direction);

        // The tail cell counts as occupied even though it is about to move away.
        board.contains(next) && !self.contains(next)
    }

    /// Moves one cell. The tail is dropped unless an `eat` is pending.
    pub fn step(&mut self, direction: Direction) {
        let next = self.next_head_position(direction);
        self.body.push_front(next);

        if self.grow_pending {
            self.grow_pending = false;
        } else {
            self.body.pop_back();
        }
    }

    pub fn can_eat(&self, apple: &Apple) -> bool {
        self.head() == apple.position()
    }

    /// Arms growth for the next `step`. The apple is either under the head or
    /// one cell away from it.
    pub fn eat(&mut self, apple: &Apple) {
        let ((hx, hy), (ax, ay)) = (self.head(), apple.position());
        debug_assert!((hx - ax).abs() + (hy - ay).abs() <= 1, "apple out of reach");
        self.grow_pending = true;
    }

    #[cfg(test)]
    pub fn is_growing(&self) -> bool {
        self.grow_pending
    }
}
