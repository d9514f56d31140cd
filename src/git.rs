//! Git capability: state classification and corrective actions.
//!
//! Everything that touches a repository goes through the [`Git`] trait.
//! [`GitCmd`] is the real implementation, shelling out to the `git` binary
//! and interpreting exit codes and status text; the convergence loop, the
//! watcher, and the monitor only see the trait, which keeps them testable
//! against scripted fakes.

use std::future::Future;
use std::path::Path;
use std::process::Output;

use git2::Repository;
use tokio::process::Command;

use crate::state::{parse_branch_status, SyncState};
use crate::{nslog_debug, nslog_trace, nslog_warn, Error, Result};

/// The single tracked branch. Multi-branch support is out of scope.
pub const BRANCH: &str = "master";

/// The single remote.
pub const REMOTE: &str = "origin";

const BOT_NAME: &str = "notesync";
const BOT_EMAIL: &str = "notesync@localhost";

/// The corrective action an update pass took, one per non-terminal state.
///
/// `MergedWithConflicts` is deliberately not an error: the conflicted tree
/// (markers included) is left behind for the next dirty cycle to commit,
/// turning an unrecoverable automatic failure into a visible artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Committed,
    Pushed,
    Merged,
    MergedWithConflicts,
}

/// Operations the sync engine needs from a repository.
pub trait Git {
    /// Compute the current [`SyncState`] of the repository at `path`.
    /// Always derived fresh; never cached across calls.
    fn state(&self, path: &Path) -> impl Future<Output = Result<SyncState>> + Send;

    /// Classify the repository and apply the one corrective action for its
    /// state. Returns what was done; commit and push failures propagate,
    /// merge conflicts do not.
    fn update(&self, path: &Path) -> impl Future<Output = Result<Action>> + Send;

    /// Cheap dirtiness probe for the watcher (no fetch, no status parsing).
    fn is_dirty(&self, path: &Path) -> impl Future<Output = Result<bool>> + Send;
}

/// [`Git`] implementation backed by the `git` command-line tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCmd;

impl GitCmd {
    pub fn new() -> Self {
        GitCmd
    }

    async fn run(&self, path: &Path, args: &[&str]) -> Result<Output> {
        nslog_trace!("run: git {} (in {})", args.join(" "), path.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .await?;
        nslog_trace!(
            "git {} exited with {}",
            args.join(" "),
            output.status
        );
        Ok(output)
    }

    /// Run a git command and fail unless it exits zero.
    async fn run_checked(&self, path: &Path, args: &[&str]) -> Result<Output> {
        let output = self.run(path, args).await?;
        if !output.status.success() {
            return Err(Error::GitCommand {
                command: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Fetch the tracked ref into the remote-tracking branch. A remote that
    /// does not have the ref yet (fresh or empty remote) is an expected
    /// condition, not an error; the status line then shows no upstream and
    /// classifies as `Ahead`.
    async fn fetch(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["fetch", REMOTE, BRANCH]).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("couldn't find remote ref") {
            nslog_debug!(
                "{}: remote has no {} yet, treating as nothing to fetch",
                path.display(),
                BRANCH
            );
            return Ok(());
        }
        Err(Error::GitCommand {
            command: format!("fetch {} {}", REMOTE, BRANCH),
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        })
    }

    /// First line of `git status --branch --porcelain`, i.e. the `## ...`
    /// branch header.
    async fn branch_status(&self, path: &Path) -> Result<String> {
        let output = self
            .run_checked(path, &["status", "--branch", "--porcelain"])
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .next()
            .map(str::to_string)
            .ok_or_else(|| Error::StatusParse(String::new()))
    }

    async fn add_all(&self, path: &Path) -> Result<()> {
        self.run_checked(path, &["add", "--all"]).await?;
        Ok(())
    }

    async fn commit(&self, path: &Path) -> Result<()> {
        let message = format!(
            "Committed at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z")
        );
        let name = format!("user.name={}", BOT_NAME);
        let email = format!("user.email={}", BOT_EMAIL);
        self.run_checked(
            path,
            &["-c", &name, "-c", &email, "commit", "-m", &message],
        )
        .await?;
        Ok(())
    }

    async fn push(&self, path: &Path) -> Result<()> {
        self.run_checked(path, &["push", REMOTE, BRANCH, "-u"]).await?;
        Ok(())
    }

    /// Merge the remote-tracking branch. A failing merge (conflict) is not
    /// an error: the working tree keeps the conflict markers and the next
    /// classification sees `Dirty`, which commits them.
    async fn merge(&self, path: &Path) -> Result<Action> {
        let remote_branch = format!("{}/{}", REMOTE, BRANCH);
        let output = self
            .run(
                path,
                &["merge", &remote_branch, "--allow-unrelated-histories", "--no-commit"],
            )
            .await?;
        if output.status.success() {
            Ok(Action::Merged)
        } else {
            nslog_warn!(
                "{}: merge of {} did not apply cleanly, leaving conflicts for the next commit: {}",
                path.display(),
                remote_branch,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(Action::MergedWithConflicts)
        }
    }
}

impl Git for GitCmd {
    async fn state(&self, path: &Path) -> Result<SyncState> {
        nslog_debug!("computing the state of {}", path.display());

        // Fail with a clear cause when the path is not a repository at all.
        let _ = Repository::open(path)?;

        if self.is_dirty(path).await? {
            return Ok(SyncState::Dirty);
        }

        self.fetch(path).await?;
        let line = self.branch_status(path).await?;
        let state = parse_branch_status(&line)?;
        nslog_debug!("{}: {:?} -> {}", path.display(), line, state);
        Ok(state)
    }

    async fn update(&self, path: &Path) -> Result<Action> {
        let state = self.state(path).await?;
        let action = match state {
            SyncState::Dirty => {
                self.add_all(path).await?;
                self.commit(path).await?;
                Action::Committed
            }
            SyncState::Ahead => {
                self.push(path).await?;
                Action::Pushed
            }
            SyncState::OutOfSync => self.merge(path).await?,
            // Sync needs no action; an Error state never reaches here
            // because classification failures surface as Err.
            SyncState::Sync | SyncState::Error => Action::None,
        };
        nslog_debug!("{}: state {} -> action {:?}", path.display(), state, action);
        Ok(action)
    }

    async fn is_dirty(&self, path: &Path) -> Result<bool> {
        let output = self.run_checked(path, &["status", "--porcelain"]).await?;
        Ok(!output.stdout.is_empty())
    }
}
