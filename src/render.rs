use crate::error::Result;
use crate::game::{Phase, State};
use crate::term::{CellStyle, RenderSink};
use crate::Position;

const SNAKE_BODY_CHAR: char = '█';
const DEAD_SNAKE_CHAR: char = 'X';
const APPLE_CHAR: char = '@';

const LOADING_MESSAGE: &str = " Press <Enter> to start ";
const GAME_OVER_MESSAGE: &str = " Game over! ";
const WON_MESSAGE: &str = " You won! ";

/// Draws one complete frame. Callers hold the game lock for the duration so
/// the frame never mixes two states.
pub fn frame(state: &State, sink: &mut dyn RenderSink) -> Result<()> {
    sink.clear()?;

    draw_border(state, sink)?;
    if let Some(apple) = state.apple {
        put(sink, apple.position(), APPLE_CHAR, CellStyle::Apple)?;
    }
    draw_snake(state, sink)?;
    draw_status(state, sink)?;

    match state.phase {
        Phase::Loading => draw_centered(state, sink, LOADING_MESSAGE, CellStyle::Banner)?,
        Phase::Over => draw_centered(state, sink, GAME_OVER_MESSAGE, CellStyle::Ending)?,
        Phase::Won => draw_centered(state, sink, WON_MESSAGE, CellStyle::Banner)?,
        Phase::Running => {}
    }

    sink.present()
}

fn put(sink: &mut dyn RenderSink, pos: Position, ch: char, style: CellStyle) -> Result<()> {
    // Board positions are never negative.
    sink.set_cell(pos.0 as u16, pos.1 as u16, ch, style)
}

fn draw_border(state: &State, sink: &mut dyn RenderSink) -> Result<()> {
    let (w, h) = (state.board.width() as u16, state.board.height() as u16);

    for x in 1..w {
        sink.set_cell(x, 0, '─', CellStyle::Border)?;
        sink.set_cell(x, h, '─', CellStyle::Border)?;
    }
    for y in 1..h {
        sink.set_cell(0, y, '│', CellStyle::Border)?;
        sink.set_cell(w, y, '│', CellStyle::Border)?;
    }

    sink.set_cell(0, 0, '┌', CellStyle::Border)?;
    sink.set_cell(w, 0, '┐', CellStyle::Border)?;
    sink.set_cell(0, h, '└', CellStyle::Border)?;
    sink.set_cell(w, h, '┘', CellStyle::Border)
}

fn draw_snake(state: &State, sink: &mut dyn RenderSink) -> Result<()> {
    let dead = state.phase == Phase::Over;

    for (i, pos) in state.snake.segments().enumerate() {
        let (ch, style) = match (dead, i) {
            (true, _) => (DEAD_SNAKE_CHAR, CellStyle::DeadSnake),
            (false, 0) => (state.direction.head_char(), CellStyle::Head),
            (false, _) => (SNAKE_BODY_CHAR, CellStyle::Snake),
        };
        put(sink, pos, ch, style)?;
    }
    Ok(())
}

fn draw_status(state: &State, sink: &mut dyn RenderSink) -> Result<()> {
    let below = state.board.height() as u16 + 1;

    draw_text(sink, 1, below, &format!("Score: {}", state.score), CellStyle::Text)?;
    draw_text(sink, 1, below + 2, "Esc or Ctrl+C to quit", CellStyle::Text)?;
    draw_text(sink, 1, below + 3, "Arrow keys or WASD to steer", CellStyle::Text)
}

fn draw_centered(
    state: &State,
    sink: &mut dyn RenderSink,
    text: &str,
    style: CellStyle,
) -> Result<()> {
    let len = text.chars().count() as u16;
    let width = state.board.width() as u16;
    let x = (width + 1).saturating_sub(len) / 2;
    let y = state.board.height() as u16 / 2;

    draw_text(sink, x, y, text, style)
}

fn draw_text(
    sink: &mut dyn RenderSink,
    x: u16,
    y: u16,
    text: &str,
    style: CellStyle,
) -> Result<()> {
    for (i, ch) in text.chars().enumerate() {
        sink.set_cell(x + i as u16, y, ch, style)?;
    }
    Ok(())
}
