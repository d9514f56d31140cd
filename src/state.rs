//! Synchronization states and the branch-status parser.
//!
//! A repository is always in exactly one of five states, derived fresh from
//! git on every classification:
//! - `Dirty`: uncommitted changes in the working tree
//! - `Ahead`: local commits not on the remote (or no upstream at all)
//! - `OutOfSync`: the remote has commits the local branch lacks
//! - `Sync`: nothing to do
//! - `Error`: the state could not be determined
//!
//! The parser understands the five literal shapes of the status line printed
//! by `git status --branch --porcelain` for a single-branch, single-remote
//! repository. Anything else is a parse failure, never a guess.

use std::fmt;

use crate::error::{Error, Result};

/// The relationship between working tree, local branch tip, and
/// remote-tracking branch tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Error,
    Dirty,
    Ahead,
    OutOfSync,
    Sync,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Error => "error",
            SyncState::Dirty => "dirty",
            SyncState::Ahead => "ahead",
            SyncState::OutOfSync => "out-of-sync",
            SyncState::Sync => "sync",
        };
        write!(f, "{}", s)
    }
}

/// Parse the `## ...` line of `git status --branch --porcelain` into a state.
///
/// Recognized shapes:
/// - `## <branch>` - no upstream configured, local work is implicitly ahead
/// - `## <branch>...<remote>/<branch>` - in sync
/// - `## <branch>...<remote>/<branch> [ahead N]` - ahead
/// - `## <branch>...<remote>/<branch> [behind N]` - out of sync
/// - `## <branch>...<remote>/<branch> [ahead N, behind M]` - out of sync
///   (any behind component forces reconciliation)
pub fn parse_branch_status(line: &str) -> Result<SyncState> {
    let bad = || Error::StatusParse(line.to_string());

    let rest = line.strip_prefix("## ").ok_or_else(bad)?;

    let (branch, upstream_part) = match rest.find("...") {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 3..])),
        None => (rest, None),
    };

    // Ref names never contain whitespace; this rejects prose lines such as
    // "## No commits yet on master" instead of misreading them as a branch.
    if branch.is_empty() || branch.contains(char::is_whitespace) {
        return Err(bad());
    }

    let Some(upstream_part) = upstream_part else {
        return Ok(SyncState::Ahead);
    };

    let (upstream, counts) = match upstream_part.find(" [") {
        Some(idx) => {
            let inner = upstream_part[idx + 2..].strip_suffix(']').ok_or_else(bad)?;
            (&upstream_part[..idx], Some(inner))
        }
        None => (upstream_part, None),
    };

    // The upstream is always <remote>/<branch>.
    if upstream.is_empty() || upstream.contains(char::is_whitespace) || !upstream.contains('/') {
        return Err(bad());
    }

    let Some(counts) = counts else {
        return Ok(SyncState::Sync);
    };

    let mut ahead = false;
    let mut behind = false;
    for part in counts.split(", ") {
        let n = if let Some(n) = part.strip_prefix("ahead ") {
            ahead = true;
            n
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = true;
            n
        } else {
            return Err(bad());
        };
        if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
    }

    if behind {
        Ok(SyncState::OutOfSync)
    } else if ahead {
        Ok(SyncState::Ahead)
    } else {
        Err(bad())
    }
}
