//! CLI argument parsing for roadlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};

/// Roadlock: exclusive write locks for collaboratively edited roadmaps.
///
/// One user at a time may edit a roadmap. Holders keep their lock alive with
/// heartbeats; locks whose holder went quiet become stale and can be taken
/// over, and expired locks are reclaimed by the sweeper.
#[derive(Parser, Debug)]
#[command(name = "roadlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit machine-readable JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for roadlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the state directory.
    ///
    /// Creates `.roadlock/` in the current directory with a default
    /// config.yaml, a locks directory and an events log directory.
    Init,

    /// Acquire (or renew) the write lock on a roadmap.
    Acquire(AcquireArgs),

    /// Extend the write lock you hold on a roadmap.
    Heartbeat(HolderArgs),

    /// Release the write lock on a roadmap.
    ///
    /// Only the holder may release unless --force is given.
    Release(ReleaseArgs),

    /// Show the lock state of a roadmap as seen by a user.
    Status(HolderArgs),

    /// List every stored lock with stale/expired markers.
    List,

    /// Reclaim expired locks once and exit.
    Sweep,

    /// Run the expiry sweeper in the foreground.
    Watch(WatchArgs),
}

/// Identity flags shared by the lock commands.
#[derive(Args, Debug, Clone, Default)]
pub struct UserArgs {
    /// User id of the caller (default: `$USER@hostname`).
    #[arg(long)]
    pub user: Option<String>,
}

/// Arguments for the `acquire` command.
#[derive(Args, Debug)]
pub struct AcquireArgs {
    /// Roadmap id.
    pub roadmap: String,

    #[command(flatten)]
    pub user: UserArgs,

    /// Display name shown to other users (default: `$USER`).
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for commands that act on one roadmap as one user.
#[derive(Args, Debug)]
pub struct HolderArgs {
    /// Roadmap id.
    pub roadmap: String,

    #[command(flatten)]
    pub user: UserArgs,
}

/// Arguments for the `release` command.
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Roadmap id.
    pub roadmap: String,

    #[command(flatten)]
    pub user: UserArgs,

    /// Remove the lock whoever holds it (administrative recovery).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `watch` command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Sweep interval in milliseconds (default: from config, TTL/5).
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Run a single sweep and exit.
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
