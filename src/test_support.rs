use crate::config::Config;
use crate::context::RoadlockContext;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A temporary project with an initialized `.roadlock/` and default config.
pub(crate) fn create_state_dir() -> (TempDir, RoadlockContext) {
    create_state_dir_with(&Config::default())
}

pub(crate) fn create_state_dir_with(config: &Config) -> (TempDir, RoadlockContext) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let ctx = RoadlockContext::at(root.join(".roadlock"));

    std::fs::create_dir_all(&ctx.locks_dir).unwrap();
    std::fs::create_dir_all(ctx.events_dir()).unwrap();
    std::fs::write(ctx.config_path(), config.to_yaml().unwrap()).unwrap();

    (temp_dir, ctx)
}

/// Parsed lines of the events log.
pub(crate) fn read_events(ctx: &RoadlockContext) -> Vec<crate::events::Event> {
    let Ok(content) = std::fs::read_to_string(ctx.events_file()) else {
        return Vec::new();
    };
    content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
