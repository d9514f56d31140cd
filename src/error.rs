use thiserror::Error;

use crate::state::SyncState;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("git not found on PATH: {0}")]
    GitNotFound(#[from] which::Error),

    #[error("git {command} failed ({status}): {stderr}")]
    GitCommand {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unparseable branch status line: {0:?}")]
    StatusParse(String),

    #[error("state did not change after an update (stuck in {state}) - something is wrong")]
    SyncStalled { state: SyncState },

    #[error("no convergence after {0} state transitions")]
    NoConvergence(usize),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
