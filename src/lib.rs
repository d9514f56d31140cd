pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod log;
pub mod monitor;
pub mod state;
pub mod watcher;

pub use error::{Error, Result};
pub use state::SyncState;
