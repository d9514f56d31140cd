//! Per-repository monitoring: scheduler, trigger channel, consumption loop.
//!
//! For each configured repository the monitor runs one sync up front, then
//! wires three tasks to a single-slot trigger channel:
//! - the watcher (emits on local edits)
//! - the scheduler (emits on a fixed cadence, so remote-only changes are
//!   picked up even when nothing changes locally)
//! - the consumption loop (runs the convergence engine per trigger)
//!
//! The channel holds at most one pending trigger and has exactly one
//! consumer, so at most one sync per repository is ever in flight; a
//! producer firing while the consumer is busy parks on `send`. That is the
//! only mutual-exclusion mechanism and it is intentional. Repositories are
//! fully independent of each other.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::engine::SyncEngine;
use crate::git::Git;
use crate::watcher::Watcher;
use crate::{nslog, nslog_error};

pub struct RepoMonitor {
    update_interval: Duration,
    cancel: CancellationToken,
}

impl RepoMonitor {
    pub fn new(update_interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            update_interval,
            cancel,
        }
    }

    /// Start monitoring one repository: initial sync, then watcher +
    /// scheduler + consumption loop on a shared trigger channel. A failed
    /// sync is logged and never stops monitoring - not of this repository,
    /// not of any other.
    pub async fn start<G, W>(&self, path: PathBuf, watcher: W, git: G)
    where
        G: Git + Send + Sync + 'static,
        W: Watcher,
    {
        let engine = SyncEngine::new(git);
        if let Err(e) = engine.converge(&path).await {
            nslog_error!("initial sync of {} failed: {}", path.display(), e);
        }

        let (trigger_tx, mut trigger_rx) = mpsc::channel::<PathBuf>(1);

        tokio::spawn(schedule_updates(
            path.clone(),
            trigger_tx.clone(),
            self.update_interval,
            self.cancel.clone(),
        ));

        tokio::spawn(watcher.watch(path.clone(), trigger_tx));

        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = trigger_rx.recv() => received,
                };
                let Some(triggered) = received else { break };
                if let Err(e) = engine.converge(&triggered).await {
                    nslog_error!("sync of {} failed: {}", triggered.display(), e);
                }
            }
        });

        nslog!("monitoring {}", path.display());
    }
}

/// Emit `path` on the trigger channel every `interval`, forever, regardless
/// of working-tree state. This is what absorbs remote-originated changes.
async fn schedule_updates(
    path: PathBuf,
    trigger: mpsc::Sender<PathBuf>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }
        let sent = tokio::select! {
            _ = cancel.cancelled() => false,
            result = trigger.send(path.clone()) => result.is_ok(),
        };
        if !sent {
            break;
        }
    }
}
