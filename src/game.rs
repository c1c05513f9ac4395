use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};

use crate::apple::Apple;
use crate::board::Board;
use crate::config::Settings;
use crate::error::Result;
use crate::render;
use crate::snake::{Direction, Snake};
use crate::sound::Sound;
use crate::term::RenderSink;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the player to press Enter.
    Loading,
    Running,
    /// The snake hit a wall or itself.
    Over,
    /// The snake covers the whole board.
    Won,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Moved,
    Ate,
    Died,
    Won,
}

/// Everything the flows share. Only reachable through `Game`, which holds it
/// behind a single lock.
pub struct State {
    pub direction: Direction,
    pub phase: Phase,
    pub score: u32,
    pub board: Board,
    pub snake: Snake,
    /// `None` once the board is full.
    pub apple: Option<Apple>,
    rng: StdRng,
}

impl State {
    fn new(board: Board, snake: Snake, direction: Direction, mut rng: StdRng) -> Self {
        let apple = Apple::spawn(&board, &snake, &mut rng);
        let phase = if apple.is_some() { Phase::Loading } else { Phase::Won };
        State { direction, phase, score: 0, board, snake, apple, rng }
    }

    #[cfg(test)]
    pub fn for_test(
        board: Board,
        snake: Snake,
        direction: Direction,
        apple: Option<Apple>,
        phase: Phase,
    ) -> Self {
        State {
            direction,
            phase,
            score: 0,
            board,
            snake,
            apple,
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn has_ended(&self) -> bool {
        matches!(self.phase, Phase::Over | Phase::Won)
    }
}

pub struct Game {
    state: Mutex<State>,
    sound: Box<dyn Sound>,
    apple_score: u32,
}

impl Game {
    pub fn new(settings: &Settings, sound: Box<dyn Sound>) -> Self {
        let board = Board::new(settings.board_width, settings.board_height);
        let state = State::new(board, Snake::new(), Direction::Up, StdRng::from_entropy());

        Game { state: Mutex::new(state), sound, apple_score: settings.apple_score }
    }

    #[cfg(test)]
    pub fn with_parts(board: Board, snake: Snake, seed: u64, sound: Box<dyn Sound>) -> Self {
        let state = State::new(board, snake, Direction::Up, StdRng::seed_from_u64(seed));
        Game { state: Mutex::new(state), sound, apple_score: Settings::default().apple_score }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicked flow leaves nothing half-written that the others can't read.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leaves the loading screen. Does nothing once the game is under way.
    pub fn start(&self) -> bool {
        let mut state = self.lock();
        if state.phase != Phase::Loading {
            return false;
        }

        state.phase = Phase::Running;
        info!("game started");
        true
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    #[cfg(test)]
    pub fn has_started(&self) -> bool {
        self.lock().phase != Phase::Loading
    }

    pub fn has_ended(&self) -> bool {
        self.lock().has_ended()
    }

    pub fn score(&self) -> u32 {
        self.lock().score
    }

    #[cfg(test)]
    pub fn direction(&self) -> Direction {
        self.lock().direction
    }

    /// Turns the snake. Repeats of the current direction are ignored, as are
    /// U-turns while the snake is longer than its head.
    pub fn set_direction(&self, direction: Direction) -> bool {
        let mut state = self.lock();

        if state.has_ended() || state.direction == direction {
            return false;
        }
        if state.snake.len() > 1 && direction == state.direction.opposite() {
            debug!("ignoring reversal to {:?}", direction);
            return false;
        }

        state.direction = direction;
        true
    }

    /// Advances the game by one step. Only a running game changes.
    pub fn tick(&self) -> TickOutcome {
        let outcome = self.advance();

        // Sound is played after the lock is released.
        match outcome {
            TickOutcome::Ate | TickOutcome::Won => self.sound.on_eat(),
            TickOutcome::Died => self.sound.on_game_over(),
            TickOutcome::Idle | TickOutcome::Moved => {}
        }
        outcome
    }

    fn advance(&self) -> TickOutcome {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.phase != Phase::Running {
            return TickOutcome::Idle;
        }

        let direction = state.direction;
        if !state.snake.can_move(&state.board, direction) {
            state.phase = Phase::Over;
            info!("game over at {:?} with score {}", state.snake.head(), state.score);
            return TickOutcome::Died;
        }

        // Growth is armed before the move so the tail stays on this very step.
        let apple = match state.apple {
            Some(apple) if state.snake.next_head_position(direction) == apple.position() => apple,
            _ => {
                state.snake.step(direction);
                return TickOutcome::Moved;
            }
        };

        state.snake.eat(&apple);
        state.snake.step(direction);
        debug_assert!(state.snake.can_eat(&apple));

        state.score += self.apple_score;
        state.apple = Apple::spawn(&state.board, &state.snake, &mut state.rng);

        match state.apple {
            Some(next) => {
                debug!("apple eaten, score {}, next apple at {:?}", state.score, next.position());
                TickOutcome::Ate
            }
            None => {
                state.phase = Phase::Won;
                info!("board filled, final score {}", state.score);
                TickOutcome::Won
            }
        }
    }

    /// Draws the current state with the lock held for the whole frame.
    pub fn render(&self, sink: &mut dyn RenderSink) -> Result<()> {
        let state = self.lock();
        render::frame(&state, sink)
    }

    /// Runs `f` against a consistent view of the state.
    #[cfg(test)]
    pub fn inspect<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&self.lock())
    }

    #[cfg(test)]
    pub fn place_apple(&self, pos: crate::Position) {
        self.lock().apple = Some(Apple::at(pos));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::*;
    use crate::sound::Recorder;
    use crate::Position;
    use std::collections::HashSet;

    fn game() -> (Game, Recorder) {
        let recorder = Recorder::default();
        let board = Board::new(70, 20);
        let game = Game::with_parts(board, Snake::new(), 3, Box::new(recorder.clone()));
        (game, recorder)
    }

    fn segments(game: &Game) -> Vec<Position> {
        game.inspect(|s| s.snake.segments().collect())
    }

    fn assert_no_overlap(game: &Game) {
        let body = segments(game);
        let distinct: HashSet<_> = body.iter().collect();
        assert_eq!(distinct.len(), body.len());
    }

    #[test]
    fn starts_loading_and_ignores_ticks() {
        let (game, _) = game();
        let before = segments(&game);

        assert_eq!(game.phase(), Phase::Loading);
        assert_eq!(game.tick(), TickOutcome::Idle);
        assert_eq!(segments(&game), before);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn start_is_idempotent() {
        let (game, _) = game();

        assert!(game.start());
        assert!(!game.start());
        assert!(game.has_started());
        assert_eq!(game.phase(), Phase::Running);
    }

    #[test]
    fn initial_apple_is_off_the_snake() {
        let (game, _) = game();
        game.inspect(|s| {
            let apple = s.apple.expect("board has room");
            assert!(!s.snake.contains(apple.position()));
        });
    }

    #[test]
    fn reversal_is_rejected() {
        let (game, _) = game();

        assert!(!game.set_direction(Down));
        assert_eq!(game.direction(), Up);
        assert!(!game.set_direction(Up), "same direction is a no-op");
        assert!(game.set_direction(Left));
        assert_eq!(game.direction(), Left);
        assert!(!game.set_direction(Right));
        assert!(game.set_direction(Down));
        assert_eq!(game.direction(), Down);
    }

    #[test]
    fn single_segment_snake_may_reverse() {
        let snake = Snake::from_segments([(5, 5)]);
        let game = Game::with_parts(Board::new(10, 10), snake, 1, Box::new(Recorder::default()));

        assert!(game.set_direction(Down));
        assert_eq!(game.direction(), Down);
    }

    #[test]
    fn moving_up_runs_into_the_top_wall() {
        let (game, sound) = game();
        game.place_apple((50, 15));
        game.start();

        for expected_y in (1..7).rev() {
            assert_eq!(game.tick(), TickOutcome::Moved);
            assert_eq!(segments(&game)[0], (9, expected_y));
            assert_no_overlap(&game);
        }

        assert_eq!(game.tick(), TickOutcome::Died);
        assert_eq!(game.phase(), Phase::Over);
        assert_eq!(game.score(), 0);
        assert_eq!(sound.game_overs(), 1);

        let frozen = segments(&game);
        for _ in 0..3 {
            assert_eq!(game.tick(), TickOutcome::Idle);
        }
        assert_eq!(segments(&game), frozen);
        assert_eq!(game.score(), 0);
        assert_eq!(sound.game_overs(), 1, "game over is signalled once");
        assert_eq!(sound.eats(), 0);
    }

    #[test]
    fn eating_the_apple_above_the_head() {
        let (game, sound) = game();
        game.place_apple((9, 6));
        game.start();

        assert_eq!(game.tick(), TickOutcome::Ate);
        assert_eq!(game.score(), 5);
        assert_eq!(segments(&game).len(), Snake::INITIAL_LENGTH + 1);
        assert_eq!(segments(&game)[0], (9, 6));
        assert_eq!(sound.eats(), 1);

        game.inspect(|s| {
            let apple = s.apple.expect("a new apple is placed");
            assert!(!s.snake.contains(apple.position()));
        });

        game.place_apple((60, 18));
        assert_eq!(game.tick(), TickOutcome::Moved);
        assert_eq!(segments(&game).len(), Snake::INITIAL_LENGTH + 1);
        assert_eq!(game.score(), 5);
    }

    #[test]
    fn length_grows_once_per_apple() {
        let (game, sound) = game();
        game.set_direction(Right);
        game.start();

        for eaten in 1..=10 {
            let ahead = game.inspect(|s| s.snake.next_head_position(s.direction));
            game.place_apple(ahead);
            assert_eq!(game.tick(), TickOutcome::Ate);
            assert_eq!(segments(&game).len(), Snake::INITIAL_LENGTH + eaten);
            assert_eq!(game.score(), 5 * eaten as u32);
            assert_no_overlap(&game);
        }
        assert_eq!(sound.eats(), 10);
    }

    #[test]
    fn running_into_the_body_ends_the_game() {
        let recorder = Recorder::default();
        let snake = Snake::from_segments([(3, 3), (4, 3), (4, 4), (3, 4), (2, 4)]);
        let game = Game::with_parts(Board::new(10, 10), snake, 9, Box::new(recorder.clone()));
        game.start();
        assert!(game.set_direction(Right));

        assert_eq!(game.tick(), TickOutcome::Died);
        assert!(game.has_ended());
        assert!(!game.set_direction(Left), "no turning after the game ended");
        assert_eq!(recorder.game_overs(), 1);
    }

    #[test]
    fn filling_the_board_wins() {
        let recorder = Recorder::default();
        // 3x1 interior: the snake holds two cells and the apple the last one.
        let snake = Snake::from_segments([(2, 1), (1, 1)]);
        let game = Game::with_parts(Board::new(4, 2), snake, 5, Box::new(recorder.clone()));
        assert_eq!(game.inspect(|s| s.apple), Some(Apple::at((3, 1))));
        game.set_direction(Right);
        game.start();

        assert_eq!(game.tick(), TickOutcome::Won);
        assert_eq!(game.phase(), Phase::Won);
        assert_eq!(game.score(), 5);
        assert_eq!(game.inspect(|s| s.apple), None);
        assert_eq!(recorder.eats(), 1);
        assert_eq!(game.tick(), TickOutcome::Idle);
    }

    #[test]
    fn render_draws_under_the_lock() {
        let (game, _) = game();
        let mut sink = crate::term::testing::MemorySink::new(80, 26);

        game.render(&mut sink).unwrap();
        assert!(sink.row(10).contains("Press <Enter> to start"));
        assert_eq!(sink.cell(9, 7).0, '^');
    }
}
