//! The convergence loop.
//!
//! `SyncEngine::converge` repeatedly classifies a repository and applies the
//! corrective action for its state until the terminal `Sync` state is
//! reached. Two guards bound the loop: an exact-repeat stall check (an
//! action that leaves the state unchanged is a logic or environment
//! problem, e.g. a push rejected on every attempt) and a hard cap on total
//! transitions, which also catches oscillation between two non-terminal
//! states that the repeat check cannot see. In practice the five-state
//! space converges within three or four transitions, e.g.
//! out-of-sync -> dirty -> ahead -> sync after a conflict.

use std::path::Path;

use crate::git::Git;
use crate::state::SyncState;
use crate::{nslog_debug, Error, Result};

/// Hard bound on state transitions per converge call. Generous compared to
/// the longest legitimate chain (three transitions).
const MAX_TRANSITIONS: usize = 8;

pub struct SyncEngine<G> {
    git: G,
}

impl<G: Git> SyncEngine<G> {
    pub fn new(git: G) -> Self {
        Self { git }
    }

    /// Drive the repository at `path` to the `Sync` state.
    ///
    /// Executor errors propagate immediately; progress failures surface as
    /// [`Error::SyncStalled`] or [`Error::NoConvergence`]. Nothing is
    /// retried here - the caller decides whether a failure is fatal.
    pub async fn converge(&self, path: &Path) -> Result<()> {
        let mut state = self.git.state(path).await?;
        nslog_debug!("{}: starting state {}", path.display(), state);

        let mut transitions = 0;
        loop {
            if state == SyncState::Sync {
                return Ok(());
            }
            if transitions >= MAX_TRANSITIONS {
                return Err(Error::NoConvergence(MAX_TRANSITIONS));
            }

            let action = self.git.update(path).await?;
            let next = self.git.state(path).await?;
            nslog_debug!(
                "{}: {} -> {:?} -> {}",
                path.display(),
                state,
                action,
                next
            );

            if next == state {
                return Err(Error::SyncStalled { state });
            }
            state = next;
            transitions += 1;
        }
    }
}
