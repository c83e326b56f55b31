use std::path::PathBuf;

use crate::board::Position;

/// A move that the board refuses to apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("position {0:?} is already occupied")]
    Occupied(Position),

    #[error("position {0:?} is outside the 3x3 board")]
    OutOfRange(Position),
}

/// Failures while driving a game or a training run.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error("invalid move: {0}")]
    Move(#[from] MoveError),

    #[error("no empty positions left to choose from")]
    NoCandidates,

    #[error("move source closed its input")]
    InputClosed,

    #[error("move source I/O error: {0}")]
    Input(#[from] std::io::Error),
}

/// Errors raised when importing a persisted value table.
#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("policy file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read policy from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed pickle policy: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("malformed JSON policy: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid board key '{0}'")]
    InvalidKey(String),

    #[error("non-finite value {value} for board key '{key}'")]
    NonFiniteValue { key: String, value: f64 },

    #[error("policy belongs to agent '{found}', expected '{expected}'")]
    AgentMismatch { expected: String, found: String },
}

/// Errors raised when exporting a value table to disk.
#[derive(Debug, thiserror::Error)]
pub enum PolicySaveError {
    #[error("failed to write policy to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode pickle policy: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("failed to encode JSON policy: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
