use thiserror::Error;

use crate::instrument::InstrumentKind;
use crate::question::GameMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EarError {
    /// A play request reached the engine before `initialize()` succeeded.
    #[error("Audio engine not initialized")]
    NotInitialized,

    /// Any operation other than `close()` after the engine was closed.
    #[error("Audio engine is closed")]
    Closed,

    #[error("Audio Error: {0}")]
    AudioError(String),

    /// Fetching or decoding an instrument's samples failed. The engine keeps
    /// running on the oscillator fallback and the load may be retried.
    #[error("Failed to load instrument {instrument}: {message}")]
    SampleLoad {
        instrument: InstrumentKind,
        message: String,
    },

    #[error("{mode} needs {requested} distinct options but only {available} are available")]
    NotEnoughOptions {
        mode: GameMode,
        requested: usize,
        available: usize,
    },

    #[error("Invalid scale degree {0}, expected 1-7")]
    InvalidDegree(u8),

    #[error("Parsing Error: {0}")]
    ParseError(String),

    #[error("Config Error: {0}")]
    ConfigError(String),

    #[error("File Error: {0}")]
    FileError(String),

    #[error("Question already answered")]
    AlreadyAnswered,

    #[error("Quiz session is complete")]
    SessionComplete,
}
