use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use log::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::game::{Game, TickOutcome};
use crate::snake::Direction::{self, *};
use crate::term::{EventSource, InputEvent, RenderSink};

/// How long the input flow waits for an event before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Start,
    Quit,
    Resize,
}

pub fn command_for(event: &InputEvent) -> Option<Command> {
    let (code, modifiers) = match event {
        InputEvent::Resize => return Some(Command::Resize),
        InputEvent::Key { code, modifiers } => (*code, *modifiers),
    };

    if modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(code, KeyCode::Char('c')).then_some(Command::Quit);
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Enter => Some(Command::Start),
        KeyCode::Char('w') | KeyCode::Up => Some(Command::Turn(Up)),
        KeyCode::Char('a') | KeyCode::Left => Some(Command::Turn(Left)),
        KeyCode::Char('s') | KeyCode::Down => Some(Command::Turn(Down)),
        KeyCode::Char('d') | KeyCode::Right => Some(Command::Turn(Right)),
        _ => None,
    }
}

fn lock_sink<S>(sink: &Mutex<S>) -> MutexGuard<'_, S> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Game lock first, then the sink.
fn render<S: RenderSink>(game: &Game, sink: &Mutex<S>) -> Result<()> {
    game.render(&mut *lock_sink(sink))
}

/// Runs the game until the player quits or a flow fails. The ticker and the
/// input listener get a thread each; the calling thread draws the first frame
/// and then waits for both before closing the sink.
pub fn run<S, E>(
    game: Arc<Game>,
    sink: Arc<Mutex<S>>,
    events: E,
    settings: &Settings,
) -> Result<()>
where
    S: RenderSink + 'static,
    E: EventSource + 'static,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let (turns, queue) = mpsc::sync_channel::<Direction>(settings.queue_capacity);

    let ticker = {
        let (game, sink, shutdown) = (game.clone(), sink.clone(), shutdown.clone());
        let interval = settings.tick_interval;
        spawn("ticker", shutdown.clone(), move || {
            tick_loop(&game, &sink, queue, &shutdown, interval)
        })?
    };
    let input = {
        let (game, sink, shutdown) = (game.clone(), sink.clone(), shutdown.clone());
        spawn("input", shutdown.clone(), move || {
            input_loop(&game, &sink, events, turns, &shutdown)
        })
    };
    let input = match input {
        Ok(handle) => handle,
        Err(err) => {
            shutdown.store(true, Ordering::SeqCst);
            let _ = join("ticker", ticker);
            return Err(err);
        }
    };

    let first_frame = render(&game, &sink);
    if first_frame.is_err() {
        shutdown.store(true, Ordering::SeqCst);
    }

    let ticked = join("ticker", ticker);
    let listened = join("input", input);
    let closed = lock_sink(&sink).close();
    info!("shut down with score {}", game.score());

    first_frame.and(ticked).and(listened).and(closed)
}

fn spawn<F>(
    name: &'static str,
    shutdown: Arc<AtomicBool>,
    body: F,
) -> Result<JoinHandle<Result<()>>>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let res = body();
            // Whichever flow stops first takes the others down with it.
            shutdown.store(true, Ordering::SeqCst);
            if let Err(err) = &res {
                warn!("{} flow failed: {}", name, err);
            }
            res
        })
        .map_err(|source| Error::Thread { name, source })
}

fn join(name: &'static str, handle: JoinHandle<Result<()>>) -> Result<()> {
    handle.join().map_err(|_| Error::Panicked(name))?
}

fn tick_loop<S: RenderSink>(
    game: &Game,
    sink: &Mutex<S>,
    queue: Receiver<Direction>,
    shutdown: &AtomicBool,
    interval: Duration,
) -> Result<()> {
    let mut deadline = Instant::now() + interval;

    while !shutdown.load(Ordering::SeqCst) {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
            deadline += interval;
        } else {
            // Late: missed ticks are dropped, not replayed back to back.
            deadline = now + interval;
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        drain_turns(game, &queue);

        if let TickOutcome::Died | TickOutcome::Won = game.tick() {
            info!("game finished with score {}", game.score());
        }
        render(game, sink)?;
    }

    debug!("ticker stopped");
    Ok(())
}

/// Applies every queued turn in arrival order, so the direction used for the
/// move is the result of the whole sequence.
fn drain_turns(game: &Game, queue: &Receiver<Direction>) {
    loop {
        match queue.try_recv() {
            Ok(direction) => {
                game.set_direction(direction);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
        }
    }
}

fn input_loop<S: RenderSink, E: EventSource>(
    game: &Game,
    sink: &Mutex<S>,
    mut events: E,
    turns: SyncSender<Direction>,
    shutdown: &AtomicBool,
) -> Result<()> {
    while !shutdown.load(Ordering::SeqCst) {
        let event = match events.poll_event(POLL_INTERVAL)? {
            Some(event) => event,
            None => continue,
        };

        match command_for(&event) {
            Some(Command::Quit) => {
                info!("quit requested");
                shutdown.store(true, Ordering::SeqCst);
            }
            Some(Command::Start) => {
                game.start();
            }
            Some(Command::Resize) => {
                debug!("terminal resized");
                lock_sink(sink).sync()?;
            }
            Some(Command::Turn(direction)) if !game.has_ended() => {
                // Blocks while the queue is full; the ticker empties it every tick.
                if turns.send(direction).is_err() {
                    break;
                }
            }
            Some(Command::Turn(_)) | None => {}
        }
    }

    debug!("input listener stopped");
    Ok(())
}
