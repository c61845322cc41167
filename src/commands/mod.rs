//! Command implementations for roadlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, and the [`Session`] every lock command opens: the
//! resolved state directory, its config, and a [`LockService`] over the
//! file-backed store.

mod acquire;
mod heartbeat;
mod init;
mod list;
mod release;
mod status;
mod sweep;


use crate::cli::{Command, UserArgs};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::context::{RoadlockContext, require_initialized};
use crate::error::{Result, RoadlockError};
use crate::events::{Event, record_event};
use crate::locks::{LockHolder, LockService};
use crate::store::{FileLockStore, owner_string};
use serde::Serialize;

/// Dispatch a command to its implementation.
///
/// `json` selects machine-readable output on stdout.
pub fn dispatch(command: Command, json: bool) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(json),
        Command::Acquire(args) => acquire::cmd_acquire(args, json),
        Command::Heartbeat(args) => heartbeat::cmd_heartbeat(args, json),
        Command::Release(args) => release::cmd_release(args, json),
        Command::Status(args) => status::cmd_status(args, json),
        Command::List => list::cmd_list(json),
        Command::Sweep => sweep::cmd_sweep(json),
        Command::Watch(args) => sweep::cmd_watch(args, json),
    }
}

/// Everything a lock command needs, resolved once per invocation.
pub(crate) struct Session<C = SystemClock> {
    pub ctx: RoadlockContext,
    pub config: Config,
    pub service: LockService<FileLockStore, C>,
}

impl Session<SystemClock> {
    /// Open the session for the state directory found from the working directory.
    pub fn open() -> Result<Self> {
        let ctx = require_initialized()?;
        Self::with_clock(ctx, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(ctx: RoadlockContext, clock: C) -> Result<Self> {
        let config = Config::load_or_default(ctx.config_path())?;
        let store = FileLockStore::new(&ctx.locks_dir);
        let service = LockService::new(store, clock, config.policy());
        Ok(Self {
            ctx,
            config,
            service,
        })
    }

    /// Append an audit event stamped with the service clock. Best-effort.
    pub fn record(&self, event: Event) {
        if self.config.audit_log {
            record_event(&self.ctx, &event.at(self.service.now()));
        }
    }
}

/// Caller identity from flags, falling back to the process owner.
pub(crate) fn resolve_user_id(args: &UserArgs) -> Result<String> {
    match &args.user {
        Some(user) if user.trim().is_empty() => Err(RoadlockError::UserError(
            "--user must not be empty".to_string(),
        )),
        Some(user) => Ok(user.clone()),
        None => Ok(owner_string()),
    }
}

/// Holder identity for `acquire`: id from `--user`, display name from `--name`
/// or `$USER`.
pub(crate) fn resolve_holder(args: &UserArgs, name: Option<&str>) -> Result<LockHolder> {
    let user_id = resolve_user_id(args)?;
    let user_name = match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => default_display_name(),
    };
    Ok(LockHolder::new(user_id, user_name))
}

fn default_display_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(|e| {
        RoadlockError::StoreError(format!("failed to serialize output: {}", e))
    })?;
    println!("{}", out);
    Ok(())
}

/// `290000` -> `4m 50s`.
pub(crate) fn format_ms(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
