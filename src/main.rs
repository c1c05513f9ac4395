mod apple;
mod board;
mod config;
mod error;
mod game;
mod render;
mod scheduler;
mod snake;
mod sound;
mod term;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::config::{Args, Settings};
use crate::game::Game;
use crate::term::{CrosstermEvents, TermManager};

pub type Position = (i16, i16);

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    config::init_logging().context("failed to set up logging")?;

    let settings = Settings::from(&args);
    info!("starting with {:?}", settings);

    let game = Arc::new(Game::new(&settings, sound::open(settings.silent)));
    let term = TermManager::new().context("failed to initialize the terminal")?;
    let sink = Arc::new(Mutex::new(term));

    scheduler::run(game.clone(), sink, CrosstermEvents, &settings).context("game loop failed")?;

    info!("exiting in phase {:?}", game.phase());
    Ok(())
}
