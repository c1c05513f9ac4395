use std::{env, fs::OpenOptions, time::Duration};

use clap::Parser;

use crate::error::{Error, Result};

/// Environment variable naming the file log output is appended to.
pub const LOG_FILE_VAR: &str = "SNAKE_LOG";

#[derive(Parser, Debug)]
#[command(about = "Snake in the terminal")]
pub struct Args {
    /// do not play sound
    #[arg(long, default_value_t = false)]
    pub silent: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub board_width: i16,
    pub board_height: i16,
    pub tick_interval: Duration,
    pub queue_capacity: usize,
    pub apple_score: u32,
    pub silent: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            board_width: 70,
            board_height: 20,
            tick_interval: Duration::from_millis(100),
            queue_capacity: 10,
            apple_score: 5,
            silent: false,
        }
    }
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Settings {
            silent: args.silent,
            ..Settings::default()
        }
    }
}

/// Sends `log` output to the file named by `SNAKE_LOG`. The terminal is in raw
/// mode on the alternate screen while playing, so there is no stderr fallback:
/// without the variable logging stays off.
pub fn init_logging() -> Result<()> {
    let path = match env::var(LOG_FILE_VAR) {
        Ok(path) if !path.is_empty() => path,
        _ => return Ok(()),
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| Error::LogFile { path: path.clone(), source })?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    Ok(())
}
