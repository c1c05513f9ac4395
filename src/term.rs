use std::io::{stdout, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, PrintStyledContent, Stylize};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, terminal};

use crate::error::Result;

/// What a cell shows; the sink decides the actual colours.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellStyle {
    Blank,
    Border,
    Snake,
    Head,
    DeadSnake,
    Apple,
    Text,
    Banner,
    Ending,
}

pub trait RenderSink: Send {
    fn clear(&mut self) -> Result<()>;
    fn set_cell(&mut self, x: u16, y: u16, symbol: char, style: CellStyle) -> Result<()>;
    fn present(&mut self) -> Result<()>;
    /// Re-reads the terminal geometry and repaints everything on the next present.
    fn sync(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key { code: KeyCode, modifiers: KeyModifiers },
    Resize,
}

pub trait EventSource: Send {
    /// Waits up to `timeout` for the next event of interest.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;
}

type Cell = (char, CellStyle);

const BLANK: Cell = (' ', CellStyle::Blank);

/// Double-buffered crossterm screen. Frames are drawn into `back` and only
/// cells that differ from `front` are written out on present.
pub struct TermManager {
    width: u16,
    height: u16,
    stdout: Stdout,
    back: Vec<Cell>,
    front: Vec<Option<Cell>>,
    active: bool,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size()?;
        let cells = width as usize * height as usize;
        let mut term = TermManager {
            width,
            height,
            stdout: stdout(),
            back: vec![BLANK; cells],
            front: vec![None; cells],
            active: false,
        };
        term.setup()?;
        Ok(term)
    }

    fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        self.active = true;
        terminal::enable_raw_mode()?;
        execute!(
            self.stdout,
            cursor::Hide,
            cursor::DisableBlinking,
            terminal::Clear(ClearType::All)
        )?;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)?;
        Ok(())
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(self.width as usize * y as usize + x as usize)
        } else {
            None
        }
    }
}

fn colors(style: CellStyle) -> (Color, Color) {
    match style {
        CellStyle::Blank => (Color::Reset, Color::Reset),
        CellStyle::Border => (Color::DarkCyan, Color::Reset),
        CellStyle::Snake => (Color::Green, Color::Reset),
        CellStyle::Head => (Color::Black, Color::Green),
        CellStyle::DeadSnake => (Color::DarkRed, Color::Reset),
        CellStyle::Apple => (Color::Red, Color::Reset),
        CellStyle::Text => (Color::Grey, Color::Reset),
        CellStyle::Banner => (Color::Blue, Color::Green),
        CellStyle::Ending => (Color::Red, Color::Black),
    }
}

impl RenderSink for TermManager {
    fn clear(&mut self) -> Result<()> {
        self.back.fill(BLANK);
        Ok(())
    }

    fn set_cell(&mut self, x: u16, y: u16, symbol: char, style: CellStyle) -> Result<()> {
        // Anything past the terminal edge is clipped.
        if let Some(i) = self.index(x, y) {
            self.back[i] = (symbol, style);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.width as usize * y as usize + x as usize;
                let cell = self.back[i];
                if self.front[i] == Some(cell) {
                    continue;
                }

                let (fg, bg) = colors(cell.1);
                let styled = cell.0.with(fg).on(bg);
                queue!(self.stdout, cursor::MoveTo(x, y), PrintStyledContent(styled))?;
                self.front[i] = Some(cell);
            }
        }

        self.stdout.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        let (width, height) = terminal::size()?;
        let cells = width as usize * height as usize;

        self.width = width;
        self.height = height;
        self.back = vec![BLANK; cells];
        self.front = vec![None; cells];
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.restore()
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Keyboard and resize events from the controlling terminal.
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        let ev = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                Some(InputEvent::Key { code: key.code, modifiers: key.modifiers })
            }
            Event::Resize(_, _) => Some(InputEvent::Resize),
            _ => None,
        };
        Ok(ev)
    }
}
