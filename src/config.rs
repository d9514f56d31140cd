use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::watcher::WatchDelays;
use crate::{nslog_debug, Error, Result};

/// Daemon configuration. `repos` is the list of working trees to keep in
/// sync; the interval fields tune the watcher and the scheduler and default
/// to values suited for note-taking (a missed sync costs nothing, the
/// hourly timer catches up).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub repos: Vec<PathBuf>,

    /// Watcher poll interval in seconds.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Debounce delay between detecting an edit and firing a trigger.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    /// Pause after firing a trigger, so the commit the engine makes does
    /// not re-trigger the watcher.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Scheduled re-sync cadence, independent of local edits.
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
}

fn default_check_interval() -> u64 {
    10
}

fn default_settle_delay() -> u64 {
    3
}

fn default_cooldown() -> u64 {
    30
}

fn default_update_interval() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            check_interval_secs: default_check_interval(),
            settle_delay_secs: default_settle_delay(),
            cooldown_secs: default_cooldown(),
            update_interval_secs: default_update_interval(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or(Error::NoHomeDir)?
            .join(".config")
            .join("notesync"))
    }

    /// Default config file path: ~/.config/notesync/notesync.toml
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("notesync.toml"))
    }

    /// Load a config file. TOML by default; a `.json` file is also accepted.
    pub fn load(path: &Path) -> Result<Self> {
        nslog_debug!("Config::load path={}", path.display());
        let raw = fs::read_to_string(path)?;
        let mut config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&raw)?
        } else {
            toml::from_str(&raw)?
        };
        for repo in &mut config.repos {
            *repo = expand_tilde(repo);
        }
        nslog_debug!(
            "Config loaded: {} repo(s), check={}s settle={}s cooldown={}s update={}s",
            config.repos.len(),
            config.check_interval_secs,
            config.settle_delay_secs,
            config.cooldown_secs,
            config.update_interval_secs
        );
        Ok(config)
    }

    /// Write a starter config at the default path. Refuses to clobber an
    /// existing file.
    pub fn write_default() -> Result<PathBuf> {
        let dir = Self::config_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let path = Self::default_path()?;
        if path.exists() {
            return Err(Error::Config(format!(
                "{} already exists, delete it first if you want a fresh one",
                path.display()
            )));
        }
        fs::write(&path, toml::to_string_pretty(&Self::default())?)?;
        Ok(path)
    }

    pub fn watch_delays(&self) -> WatchDelays {
        WatchDelays {
            poll_interval: Duration::from_secs(self.check_interval_secs),
            settle_delay: Duration::from_secs(self.settle_delay_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
