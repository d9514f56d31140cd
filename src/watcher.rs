//! Change detection by polling.
//!
//! `ChangeWatcher` polls a repository's working tree for dirtiness
//! (no filesystem-event notification) and emits the repository
//! path on the trigger channel when edits are found. Three delays shape its
//! behavior:
//! - poll interval: how often to probe for dirtiness
//! - settle delay: wait after the first detected edit so a burst of writes
//!   collapses into one trigger
//! - cooldown: wait after emitting so the commit the engine is about to
//!   make does not immediately re-trigger the watcher

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::git::Git;
use crate::{nslog, nslog_debug, nslog_warn};

/// The three watcher delays, usually taken from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct WatchDelays {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub cooldown: Duration,
}

/// Something that can watch a repository path and emit triggers.
/// The monitor only depends on this seam.
pub trait Watcher: Send + 'static {
    fn watch(
        self,
        path: PathBuf,
        trigger: mpsc::Sender<PathBuf>,
    ) -> impl Future<Output = ()> + Send;
}

/// Poll-based dirtiness watcher over a [`Git`] implementation.
pub struct ChangeWatcher<G> {
    git: G,
    delays: WatchDelays,
    cancel: CancellationToken,
}

impl<G: Git + Send + Sync + 'static> ChangeWatcher<G> {
    pub fn new(git: G, delays: WatchDelays, cancel: CancellationToken) -> Self {
        Self {
            git,
            delays,
            cancel,
        }
    }

    /// One poll cycle: probe, settle, emit, cool down. Probe errors are
    /// logged and treated as "not dirty" for this cycle; the next poll
    /// self-heals.
    async fn check(&self, path: &Path, trigger: &mpsc::Sender<PathBuf>) {
        let dirty = match self.git.is_dirty(path).await {
            Ok(dirty) => dirty,
            Err(e) => {
                nslog_warn!("{}: dirtiness check failed: {}", path.display(), e);
                false
            }
        };
        if !dirty {
            return;
        }

        nslog_debug!("{}: changes detected", path.display());
        if !self.pause(self.delays.settle_delay).await {
            return;
        }

        // The channel holds a single trigger; if the consumer is mid-sync
        // this send parks until it is ready, which is the backpressure that
        // serializes sync attempts for the path.
        let sent = tokio::select! {
            _ = self.cancel.cancelled() => false,
            result = trigger.send(path.to_path_buf()) => result.is_ok(),
        };
        if !sent {
            return;
        }

        self.pause(self.delays.cooldown).await;
    }

    /// Cancellation-aware sleep. Returns false if cancelled mid-sleep.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }
}

impl<G: Git + Send + Sync + 'static> Watcher for ChangeWatcher<G> {
    async fn watch(self, path: PathBuf, trigger: mpsc::Sender<PathBuf>) {
        nslog!("watching {} for changes", path.display());
        loop {
            if !self.pause(self.delays.poll_interval).await {
                break;
            }
            self.check(&path, &trigger).await;
        }
        nslog_debug!("{}: watcher stopped", path.display());
    }
}
