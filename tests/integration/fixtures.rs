//! Test fixtures for integration tests.
//!
//! Provides a local repository wired to a bare "remote" in the same
//! temp directory, plus a second writer clone for simulating commits
//! pushed by another machine.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A local repository tracking a bare remote, both under one temp dir.
pub struct RepoPair {
    /// Owns every repository created by this fixture.
    pub temp_dir: TempDir,
    /// Path to the bare remote repository.
    pub remote: PathBuf,
    /// Path to the local working repository.
    pub local: PathBuf,
}

impl RepoPair {
    /// Create a local repo with one pushed commit and its bare remote.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let remote = temp_dir.path().join("remote.git");
        let local = temp_dir.path().join("local");

        std::fs::create_dir(&remote).expect("Failed to create remote dir");
        git(&remote, &["init", "--bare"]);
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/master"]);

        std::fs::create_dir(&local).expect("Failed to create local dir");
        git(&local, &["init"]);
        git(&local, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        configure_user(&local);
        git(
            &local,
            &["remote", "add", "origin", remote.to_str().unwrap()],
        );

        let pair = Self {
            temp_dir,
            remote,
            local,
        };
        pair.write_local("README.md", "# Notes\n");
        commit_all(&pair.local, "Initial commit");
        git(&pair.local, &["push", "origin", "master", "-u"]);
        pair
    }

    /// Write a file into the local repository without committing it.
    pub fn write_local(&self, filename: &str, content: &str) {
        write_file(&self.local, filename, content);
    }

    /// Clone the remote into a second working copy with its own identity.
    ///
    /// Commits made here and pushed simulate edits from another machine.
    pub fn writer_clone(&self) -> PathBuf {
        let writer = self.temp_dir.path().join("writer");
        git(
            self.temp_dir.path(),
            &["clone", self.remote.to_str().unwrap(), "writer"],
        );
        configure_user(&writer);
        writer
    }

    /// Commit a file in the writer clone and push it to the remote.
    pub fn push_from_writer(&self, writer: &Path, filename: &str, content: &str) {
        write_file(writer, filename, content);
        commit_all(writer, &format!("Edit {}", filename));
        git(writer, &["push", "origin", "master"]);
    }
}

impl Default for RepoPair {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a git command in `path`, panicking with stderr on failure.
pub fn git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .expect("Failed to spawn git");

    if !output.status.success() {
        panic!(
            "git {:?} failed in {}: {}",
            args,
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Run a git command and capture trimmed stdout.
pub fn git_stdout(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .expect("Failed to spawn git");

    if !output.status.success() {
        panic!(
            "git {:?} failed in {}: {}",
            args,
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_user(path: &Path) {
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
}

/// Write a file relative to the repository root.
pub fn write_file(repo: &Path, filename: &str, content: &str) {
    let file_path = repo.join(filename);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&file_path, content).expect("Failed to write file");
}

/// Stage everything and commit it.
pub fn commit_all(repo: &Path, message: &str) {
    git(repo, &["add", "--all"]);
    git(repo, &["commit", "-m", message]);
}

/// Resolve the commit hash a repository's master branch points at.
///
/// Works for bare and non-bare repositories alike.
pub fn master_commit(repo: &Path) -> String {
    let repository = git2::Repository::open(repo).expect("Failed to open repository");
    let id = repository
        .revparse_single("refs/heads/master")
        .expect("Failed to resolve master")
        .id()
        .to_string();
    id
}

/// Count commits reachable from master.
pub fn commit_count(repo: &Path) -> usize {
    let repository = git2::Repository::open(repo).expect("Failed to open repository");
    let mut revwalk = repository.revwalk().expect("Failed to create revwalk");
    revwalk
        .push_ref("refs/heads/master")
        .expect("Failed to push master");
    revwalk.count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_pair_creation() {
        let pair = RepoPair::new();
        assert!(pair.local.join(".git").exists());
        assert!(pair.remote.join("HEAD").exists());
        assert_eq!(master_commit(&pair.local), master_commit(&pair.remote));
        assert_eq!(commit_count(&pair.local), 1);
    }

    #[test]
    fn test_writer_clone_pushes_to_remote() {
        let pair = RepoPair::new();
        let writer = pair.writer_clone();
        pair.push_from_writer(&writer, "notes.md", "from writer\n");

        assert_eq!(commit_count(&pair.remote), 2);
        assert_ne!(master_commit(&pair.local), master_commit(&pair.remote));
    }
}
