//! Implementation of the `roadlock init` command.
//!
//! Creates the state directory (default: `.roadlock/` in the working
//! directory, or `$ROADLOCK_DIR`):
//! 1. `config.yaml` with defaults (if missing)
//! 2. `locks/` for lock records
//! 3. `events/` for the audit log
//!
//! Running it again is harmless: existing config and locks are left alone.

use super::print_json;
use crate::config::Config;
use crate::context::RoadlockContext;
use crate::error::{Result, RoadlockError};
use crate::events::{Event, EventAction, record_event};
use crate::fs::atomic_write_file;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitReport {
    pub state_dir: PathBuf,
    pub created: bool,
    pub config_written: bool,
}

/// Execute the `roadlock init` command.
pub fn cmd_init(json: bool) -> Result<()> {
    let ctx = RoadlockContext::resolve()?;
    let report = init_state_dir(&ctx)?;

    if json {
        return print_json(&report);
    }

    if report.created {
        println!("Initialized roadlock.");
    } else {
        println!("roadlock already initialized.");
    }
    println!();
    println!("State directory: {}", ctx.state_dir.display());
    println!("  config.yaml{}", if report.config_written { "" } else { "  (kept)" });
    println!("  locks/");
    println!("  events/");

    Ok(())
}

/// Create the state directory layout under `ctx`.
pub(crate) fn init_state_dir(ctx: &RoadlockContext) -> Result<InitReport> {
    let created = !ctx.is_initialized();

    create_dir(&ctx.state_dir, "state")?;
    create_dir(&ctx.locks_dir, "locks")?;
    create_dir(&ctx.events_dir(), "events")?;

    let config_path = ctx.config_path();
    let config_written = !config_path.exists();
    if config_written {
        atomic_write_file(&config_path, &Config::default().to_yaml()?)?;
    } else {
        // Surface a broken config now rather than on the first lock command.
        Config::load(&config_path)?;
    }

    if created {
        record_event(
            ctx,
            &Event::new(EventAction::Init)
                .with_details(json!({"state_dir": ctx.state_dir.display().to_string()})),
        );
    }

    Ok(InitReport {
        state_dir: ctx.state_dir.clone(),
        created,
        config_written,
    })
}

fn create_dir(path: &Path, what: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        RoadlockError::UserError(format!(
            "failed to create {} directory '{}': {}",
            what,
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::read_events;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = RoadlockContext::at(temp_dir.path().join(".roadlock"));

        let report = init_state_dir(&ctx).unwrap();

        assert!(report.created);
        assert!(report.config_written);
        assert!(ctx.locks_dir.is_dir());
        assert!(ctx.events_dir().is_dir());
        assert_eq!(Config::load(ctx.config_path()).unwrap(), Config::default());

        let events = read_events(&ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::Init);
    }

    #[test]
    fn test_init_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = RoadlockContext::at(temp_dir.path().join(".roadlock"));
        init_state_dir(&ctx).unwrap();
        fs::write(ctx.config_path(), "lock_ttl_seconds: 600\n").unwrap();

        let report = init_state_dir(&ctx).unwrap();

        assert!(!report.created);
        assert!(!report.config_written);
        assert_eq!(Config::load(ctx.config_path()).unwrap().lock_ttl_seconds, 600);
        assert_eq!(read_events(&ctx).len(), 1);
    }

    #[test]
    fn test_init_rejects_invalid_existing_config() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = RoadlockContext::at(temp_dir.path().join(".roadlock"));
        init_state_dir(&ctx).unwrap();
        fs::write(ctx.config_path(), "lock_ttl_seconds: 0\n").unwrap();

        assert!(init_state_dir(&ctx).is_err());
    }
}
