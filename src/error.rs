use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("audio device unavailable: {0}")]
    Audio(String),

    #[error("could not open log file {path}: {source}")]
    LogFile { path: String, source: io::Error },

    #[error("could not start {name} thread: {source}")]
    Thread { name: &'static str, source: io::Error },

    #[error("{0} thread panicked")]
    Panicked(&'static str),

    #[error("logger already initialized")]
    Logger(#[from] log::SetLoggerError),
}
