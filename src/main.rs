use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use notesync::config::Config;
use notesync::git::GitCmd;
use notesync::monitor::RepoMonitor;
use notesync::watcher::ChangeWatcher;
use notesync::{nslog, nslog_warn, Result};

/// Notesync - keeps note repositories in sync with their remotes
#[derive(Parser, Debug)]
#[command(name = "notesync")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    NOTESYNC_DEBUG=1    Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/notesync/notesync.toml)
    pub config: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.notesync/notesync.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Write a starter config file at the default location
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    notesync::log::init_with_debug(cli.debug);

    if let Some(Command::Init) = cli.command {
        let path = Config::write_default()?;
        println!("Wrote {}", path.display());
        println!("Add your repositories under `repos` and start notesync.");
        return Ok(());
    }

    // Every action shells out to git; fail fast if it is not installed.
    which::which("git")?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;
    if config.repos.is_empty() {
        nslog_warn!(
            "no repositories configured in {}, nothing to monitor",
            config_path.display()
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    nslog!("notesync is starting");

    let cancel = CancellationToken::new();
    let git = GitCmd::new();
    let monitor = RepoMonitor::new(config.update_interval(), cancel.clone());

    for repo in &config.repos {
        let watcher = ChangeWatcher::new(git, config.watch_delays(), cancel.child_token());
        monitor.start(repo.clone(), watcher, git).await;
    }

    tokio::signal::ctrl_c().await?;
    nslog!("shutting down");
    cancel.cancel();
    Ok(())
}
