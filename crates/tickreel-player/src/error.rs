//! Error types for the tickreel player binary.
//!
//! [`PlayerError`] wraps every failure that can end the process, so `main`
//! can propagate with `?`. Console input errors are reported and skipped.

use tickreel_core::{ConfigError, DataError, SpoolerError};

/// Top-level error for the player binary.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The simulation document could not be loaded.
    #[error("simulation error: {source}")]
    Data {
        /// The underlying data error.
        #[from]
        source: DataError,
    },

    /// A playback operation failed.
    #[error("playback error: {source}")]
    Spooler {
        /// The underlying spooler error.
        #[from]
        source: SpoolerError,
    },

    /// Reading console input or installing the Ctrl-C handler failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Status could not be serialized.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// A console line could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line was empty.
    #[error("empty command")]
    Empty,

    /// The command word is not known.
    #[error("unknown command: {command}")]
    Unknown {
        /// The unrecognized command word.
        command: String,
    },

    /// The command needs an argument that was not given.
    #[error("{command} needs a number")]
    MissingArgument {
        /// The command missing its argument.
        command: &'static str,
    },

    /// An argument is not a number.
    #[error("invalid number {value}: {source}")]
    InvalidNumber {
        /// The text that failed to parse.
        value: String,
        /// The underlying parse error.
        source: std::num::ParseFloatError,
    },
}
