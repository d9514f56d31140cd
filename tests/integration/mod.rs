//! Integration test suite for notesync.
//!
//! These tests run against real git repositories created under a temp
//! directory, with a bare repo standing in for the remote. They verify
//! that classification, single updates, and full convergence behave the
//! same way the daemon would drive them.
//!
//! # Test Categories
//!
//! - `sync_flow`: State classification and convergence against real repos
//! - `monitoring`: Full-stack watcher + scheduler + engine runs
//!
//! # CI Compatibility
//!
//! All remotes are local bare repositories, so the tests never touch the
//! network and are safe to run in CI.

mod fixtures;

mod monitoring;
