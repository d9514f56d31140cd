//! Full-stack monitoring runs: watcher, scheduler, and engine wired
//! together over real repositories, with short real-time delays.

use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use notesync::git::GitCmd;
use notesync::monitor::RepoMonitor;
use notesync::watcher::{ChangeWatcher, WatchDelays};

use super::fixtures::{master_commit, RepoPair};

fn fast_delays() -> WatchDelays {
    WatchDelays {
        poll_interval: Duration::from_millis(50),
        settle_delay: Duration::from_millis(100),
        cooldown: Duration::from_millis(200),
    }
}

/// Poll until the two repositories point at the same master commit.
async fn wait_for_agreement(a: &Path, b: &Path) {
    for _ in 0..200 {
        if master_commit(a) == master_commit(b) {
            return;
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!(
        "repositories never agreed: {} vs {}",
        master_commit(a),
        master_commit(b)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watcher_syncs_local_edit_to_remote() {
    let pair = RepoPair::new();
    let git = GitCmd::new();
    let cancel = CancellationToken::new();

    // Scheduler effectively off; only the watcher can trigger.
    let monitor = RepoMonitor::new(Duration::from_secs(3600), cancel.clone());
    let watcher = ChangeWatcher::new(git, fast_delays(), cancel.child_token());
    monitor.start(pair.local.clone(), watcher, git).await;

    let before = master_commit(&pair.remote);
    pair.write_local("notes.md", "watched edit\n");

    for _ in 0..200 {
        if master_commit(&pair.remote) != before {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert_ne!(master_commit(&pair.remote), before, "edit never synced");
    wait_for_agreement(&pair.local, &pair.remote).await;

    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduler_pulls_remote_edit_without_local_activity() {
    let pair = RepoPair::new();
    let git = GitCmd::new();
    let cancel = CancellationToken::new();

    // Watcher polls rarely; the scheduled update has to do the work.
    let slow = WatchDelays {
        poll_interval: Duration::from_secs(3600),
        settle_delay: Duration::from_millis(100),
        cooldown: Duration::from_millis(200),
    };
    let monitor = RepoMonitor::new(Duration::from_millis(300), cancel.clone());
    let watcher = ChangeWatcher::new(git, slow, cancel.child_token());
    monitor.start(pair.local.clone(), watcher, git).await;

    let writer = pair.writer_clone();
    pair.push_from_writer(&writer, "remote.md", "from writer\n");

    wait_for_agreement(&pair.local, &pair.remote).await;

    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_stops_all_monitoring_tasks() {
    let pair = RepoPair::new();
    let git = GitCmd::new();
    let cancel = CancellationToken::new();

    let monitor = RepoMonitor::new(Duration::from_millis(200), cancel.clone());
    let watcher = ChangeWatcher::new(git, fast_delays(), cancel.child_token());
    monitor.start(pair.local.clone(), watcher, git).await;

    cancel.cancel();
    // Give the tasks a moment to observe cancellation.
    sleep(Duration::from_millis(300)).await;

    let before = master_commit(&pair.remote);
    pair.write_local("notes.md", "edit after shutdown\n");
    sleep(Duration::from_secs(1)).await;

    assert_eq!(master_commit(&pair.remote), before, "synced after cancel");
}
