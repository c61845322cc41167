//! State directory resolution for roadlock.
//!
//! Every command operates on one state directory (`.roadlock/` by default)
//! holding the config, the lock records and the audit log. The directory is
//! found by walking upward from the working directory, so commands behave the
//! same from any subdirectory of a project. `ROADLOCK_DIR` overrides the
//! lookup.

use crate::error::{Result, RoadlockError};
use std::env;
use std::path::{Path, PathBuf};

/// Default state directory name.
pub const DEFAULT_STATE_DIR: &str = ".roadlock";

/// Environment variable naming an explicit state directory.
pub const STATE_DIR_ENV: &str = "ROADLOCK_DIR";

/// Resolved paths for the roadlock state directory. All paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadlockContext {
    /// The state directory itself (default: `{project}/.roadlock/`).
    pub state_dir: PathBuf,

    /// Directory of lock records (default: `{state_dir}/locks/`).
    pub locks_dir: PathBuf,
}

impl RoadlockContext {
    /// Resolve the context from the current working directory and environment.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            RoadlockError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        let override_dir = env::var_os(STATE_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self::resolve_in(&cwd, override_dir)
    }

    /// Resolve from `cwd`, using `override_dir` instead of the upward search
    /// when given. A relative override is taken relative to `cwd`.
    pub fn resolve_in<P: AsRef<Path>>(cwd: P, override_dir: Option<PathBuf>) -> Result<Self> {
        let cwd = cwd.as_ref();
        match override_dir {
            Some(dir) if dir.is_absolute() => Ok(Self::at(dir)),
            Some(dir) => Ok(Self::at(cwd.join(dir))),
            None => Self::resolve_from(cwd),
        }
    }

    /// Find the nearest `.roadlock/` at or above `cwd`.
    ///
    /// When none exists the context points at `{cwd}/.roadlock/`, which is
    /// where `roadlock init` creates it.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let cwd = cwd.as_ref();
        if !cwd.is_absolute() {
            return Err(RoadlockError::UserError(format!(
                "working directory must be absolute: {}",
                cwd.display()
            )));
        }

        let found = cwd
            .ancestors()
            .map(|dir| dir.join(DEFAULT_STATE_DIR))
            .find(|candidate| candidate.is_dir());

        Ok(Self::at(
            found.unwrap_or_else(|| cwd.join(DEFAULT_STATE_DIR)),
        ))
    }

    /// Context rooted at an explicit state directory.
    pub fn at(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let locks_dir = state_dir.join("locks");
        Self {
            state_dir,
            locks_dir,
        }
    }

    /// Check if the state directory exists.
    pub fn is_initialized(&self) -> bool {
        self.state_dir.is_dir()
    }

    /// Ensure the state directory exists, returning an error if not.
    ///
    /// Called by all commands except `init`.
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(RoadlockError::UserError(format!(
                "roadlock not initialized.\n\
                 Expected state directory at: {}\n\n\
                 Run `roadlock init` to create it, or set {} to an existing one.",
                self.state_dir.display(),
                STATE_DIR_ENV
            )));
        }
        Ok(())
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join("config.yaml")
    }

    /// Get the path to the events directory.
    pub fn events_dir(&self) -> PathBuf {
        self.state_dir.join("events")
    }

    /// Get the path to the main events log file.
    pub fn events_file(&self) -> PathBuf {
        self.events_dir().join("events.ndjson")
    }
}

/// Resolve the context and ensure the state directory exists.
///
/// Use this in every command except `init`.
pub fn require_initialized() -> Result<RoadlockContext> {
    let ctx = RoadlockContext::resolve()?;
    ctx.ensure_initialized()?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    fn canonical_tempdir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_resolve_without_state_dir_points_at_cwd() {
        let (_temp_dir, root) = canonical_tempdir();
        let ctx = RoadlockContext::resolve_from(&root).unwrap();

        assert_eq!(ctx.state_dir, root.join(".roadlock"));
        assert_eq!(ctx.locks_dir, root.join(".roadlock").join("locks"));
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_resolve_from_subdirectory_finds_ancestor() {
        let (_temp_dir, root) = canonical_tempdir();
        std::fs::create_dir_all(root.join(".roadlock")).unwrap();
        let nested = root.join("plans").join("2026");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = RoadlockContext::resolve_from(&nested).unwrap();

        assert_eq!(ctx.state_dir, root.join(".roadlock"));
        assert!(ctx.is_initialized());
    }

    #[test]
    fn test_nearest_state_dir_wins() {
        let (_temp_dir, root) = canonical_tempdir();
        let inner = root.join("team");
        std::fs::create_dir_all(root.join(".roadlock")).unwrap();
        std::fs::create_dir_all(inner.join(".roadlock")).unwrap();

        let ctx = RoadlockContext::resolve_from(&inner).unwrap();
        assert_eq!(ctx.state_dir, inner.join(".roadlock"));
    }

    #[test]
    fn test_state_file_is_not_a_state_dir() {
        let (_temp_dir, root) = canonical_tempdir();
        std::fs::write(root.join(".roadlock"), "not a directory").unwrap();

        let ctx = RoadlockContext::resolve_from(&root).unwrap();
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_override_dir() {
        let (_temp_dir, root) = canonical_tempdir();

        let absolute = root.join("elsewhere");
        let ctx = RoadlockContext::resolve_in(&root, Some(absolute.clone())).unwrap();
        assert_eq!(ctx.state_dir, absolute);

        let ctx = RoadlockContext::resolve_in(&root, Some(PathBuf::from("rel"))).unwrap();
        assert_eq!(ctx.state_dir, root.join("rel"));
    }

    #[test]
    fn test_relative_cwd_rejected() {
        let err = RoadlockContext::resolve_from("relative/path").unwrap_err();
        assert!(matches!(err, RoadlockError::UserError(_)));
    }

    #[test]
    fn test_ensure_initialized() {
        let (_temp_dir, root) = canonical_tempdir();
        let ctx = RoadlockContext::resolve_from(&root).unwrap();

        let err = ctx.ensure_initialized().unwrap_err();
        assert!(err.to_string().contains("roadlock init"));

        std::fs::create_dir_all(&ctx.state_dir).unwrap();
        assert!(ctx.ensure_initialized().is_ok());
    }

    #[test]
    fn test_paths() {
        let ctx = RoadlockContext::at("/srv/plans/.roadlock");

        assert!(ctx.config_path().ends_with(".roadlock/config.yaml"));
        assert!(ctx.events_dir().ends_with(".roadlock/events"));
        assert!(ctx.events_file().ends_with("events/events.ndjson"));
        assert!(ctx.locks_dir.ends_with(".roadlock/locks"));
    }

    #[test]
    #[serial]
    fn test_resolve_uses_current_dir() {
        let (_temp_dir, root) = canonical_tempdir();
        std::fs::create_dir_all(root.join(".roadlock")).unwrap();
        let nested = root.join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let _guard = DirGuard::new(&nested);
        // Only meaningful when the override is not set in the test environment.
        if env::var_os(STATE_DIR_ENV).is_none() {
            let ctx = require_initialized().unwrap();
            assert_eq!(ctx.state_dir.canonicalize().unwrap(), root.join(".roadlock"));
        }
    }
}
