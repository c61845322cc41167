//! Per-key guard files for the file-backed store.
//!
//! A guard is an exclusive OS advisory lock (`flock` on Unix, `LockFileEx` on
//! Windows) on `<roadmap>.guard`, held only for the read-compare-write window
//! of a single compare-and-set. The kernel drops the lock when the holding
//! file handle closes, including when the process crashes, so a guard is
//! never left behind and never has to be broken by another caller.
//!
//! Guard files stay on disk after release. Deleting them would let a caller
//! that already opened the old inode lock it while a newcomer locks a fresh
//! file at the same path.

use crate::error::{Result, RoadlockError};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Metadata written into a guard file while it is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardMetadata {
    /// Owner of the guard (e.g., `user@HOST`).
    pub owner: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    pub created_at: DateTime<Utc>,

    /// The store operation holding the guard (compare_and_set/remove).
    pub action: String,
}

impl GuardMetadata {
    pub fn new(action: &str) -> Self {
        Self {
            owner: owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    /// Read the metadata of the current (or last) holder.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to read guard file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to parse guard file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// `user@HOST` for the current process.
pub fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// RAII guard for one roadmap key. Dropping it releases the advisory lock.
#[derive(Debug)]
pub struct KeyGuard {
    path: PathBuf,
    file: File,
}

impl KeyGuard {
    /// Try to take the guard at `path` without waiting.
    ///
    /// Returns `Ok(None)` if another handle (in this or any other process)
    /// holds the guard.
    pub fn try_acquire(path: &Path, action: &str) -> Result<Option<Self>> {
        // Never truncate before holding the lock: the content belongs to the holder.
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                RoadlockError::StoreError(format!(
                    "failed to open guard '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => {
                return Err(RoadlockError::StoreError(format!(
                    "failed to lock guard '{}': {}",
                    path.display(),
                    e
                )));
            }
        }

        let mut guard = Self {
            path: path.to_path_buf(),
            file,
        };
        guard.write_metadata(action)?;
        Ok(Some(guard))
    }

    fn write_metadata(&mut self, action: &str) -> Result<()> {
        let json = serde_json::to_string(&GuardMetadata::new(action)).map_err(|e| {
            RoadlockError::StoreError(format!("failed to serialize guard metadata: {}", e))
        })?;
        self.file
            .set_len(0)
            .and_then(|()| self.file.write_all(json.as_bytes()))
            .map_err(|e| {
                RoadlockError::StoreError(format!(
                    "failed to write guard '{}': {}",
                    self.path.display(),
                    e
                ))
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly, surfacing any unlock error.
    pub fn release(self) -> Result<()> {
        FileExt::unlock(&self.file).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to release guard '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn guard_is_exclusive_until_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q3.guard");

        let first = KeyGuard::try_acquire(&path, "compare_and_set")
            .unwrap()
            .expect("first guard");
        assert!(path.exists());

        let second = KeyGuard::try_acquire(&path, "compare_and_set").unwrap();
        assert!(second.is_none());

        drop(first);

        let third = KeyGuard::try_acquire(&path, "remove").unwrap();
        assert!(third.is_some());
    }

    #[test]
    fn guard_metadata_records_action() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q3.guard");

        let guard = KeyGuard::try_acquire(&path, "remove").unwrap().unwrap();
        let meta = GuardMetadata::from_file(guard.path()).unwrap();
        assert_eq!(meta.action, "remove");
        assert_eq!(meta.pid, Some(std::process::id()));
        assert!(meta.owner.contains('@'));

        guard.release().unwrap();
        assert!(KeyGuard::try_acquire(&path, "remove").unwrap().is_some());
    }

    #[test]
    fn leftover_guard_file_from_crashed_holder_is_reusable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q3.guard");

        // A crashed holder leaves its file but no lock.
        let mut meta = GuardMetadata::new("compare_and_set");
        meta.created_at = Utc::now() - Duration::minutes(5);
        meta.pid = Some(u32::MAX);
        fs::write(&path, serde_json::to_string(&meta).unwrap()).unwrap();

        let guard = KeyGuard::try_acquire(&path, "remove").unwrap().unwrap();
        let rewritten = GuardMetadata::from_file(guard.path()).unwrap();
        assert_eq!(rewritten.action, "remove");
        assert_eq!(rewritten.pid, Some(std::process::id()));
    }

    #[test]
    fn old_guard_content_does_not_admit_second_holder() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q3.guard");

        let mut meta = GuardMetadata::new("compare_and_set");
        meta.created_at = Utc::now() - Duration::minutes(5);
        fs::write(&path, serde_json::to_string(&meta).unwrap()).unwrap();

        // First caller takes the leftover guard; a second caller that also saw
        // the old content must still be refused while the first holds it.
        let first = KeyGuard::try_acquire(&path, "compare_and_set")
            .unwrap()
            .unwrap();
        assert!(KeyGuard::try_acquire(&path, "compare_and_set").unwrap().is_none());
        assert!(path.exists());

        drop(first);
        assert!(KeyGuard::try_acquire(&path, "compare_and_set").unwrap().is_some());
    }

    #[test]
    fn concurrent_callers_get_at_most_one_guard() {
        let temp_dir = TempDir::new().unwrap();
        let path = Arc::new(temp_dir.path().join("q3.guard"));

        let mut meta = GuardMetadata::new("compare_and_set");
        meta.created_at = Utc::now() - Duration::minutes(5);
        fs::write(path.as_ref(), serde_json::to_string(&meta).unwrap()).unwrap();

        let threads = 8;
        let start = Arc::new(Barrier::new(threads));
        let held = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let path = Arc::clone(&path);
                let start = Arc::clone(&start);
                let held = Arc::clone(&held);
                thread::spawn(move || {
                    start.wait();
                    let guard = KeyGuard::try_acquire(&path, "compare_and_set").unwrap();
                    // Keep every winner's guard alive until all callers have tried.
                    held.wait();
                    guard.is_some()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
