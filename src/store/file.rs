//! File-backed lock store.
//!
//! Layout under the locks directory:
//! - `<roadmap>.json`: the current [`WriteLock`] record (absent when unlocked)
//! - `<roadmap>.guard`: per-key advisory lock held during a compare-and-set
//! - `<roadmap>.json.corrupt`: an unparseable record set aside by `remove`
//!
//! Records are replaced with an atomic rename, so readers never observe a
//! partially written lock even without taking the guard.

use super::guard::{GuardMetadata, KeyGuard};
use super::{LockStore, validate_roadmap_id};
use crate::error::{Result, RoadlockError};
use crate::fs::atomic_write_file;
use crate::locks::WriteLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

const RECORD_EXTENSION: &str = "json";
const GUARD_EXTENSION: &str = "guard";
const QUARANTINE_SUFFIX: &str = "corrupt";

/// Attempts made by `remove` to take a busy guard before giving up.
const REMOVE_GUARD_ATTEMPTS: u32 = 5;
const REMOVE_GUARD_BACKOFF_MS: u64 = 10;

#[derive(Debug, Clone)]
pub struct FileLockStore {
    dir: PathBuf,
}

impl FileLockStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, roadmap_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", roadmap_id, RECORD_EXTENSION))
    }

    pub fn guard_path(&self, roadmap_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", roadmap_id, GUARD_EXTENSION))
    }

    pub fn quarantine_path(&self, roadmap_id: &str) -> PathBuf {
        self.dir.join(format!(
            "{}.{}.{}",
            roadmap_id, RECORD_EXTENSION, QUARANTINE_SUFFIX
        ))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                RoadlockError::StoreError(format!(
                    "failed to create locks directory '{}': {}",
                    self.dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    fn read_record(path: &Path) -> Result<Option<WriteLock>> {
        match Self::read_raw(path)? {
            RawRecord::Missing => Ok(None),
            RawRecord::Parsed(lock) => Ok(Some(lock)),
            RawRecord::Corrupt(e) => Err(RoadlockError::StoreError(format!(
                "failed to parse lock record '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn read_raw(path: &Path) -> Result<RawRecord> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RawRecord::Missing),
            Err(e) => {
                return Err(RoadlockError::StoreError(format!(
                    "failed to read lock record '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        Ok(match serde_json::from_str(&content) {
            Ok(lock) => RawRecord::Parsed(lock),
            Err(e) => RawRecord::Corrupt(e),
        })
    }

    /// Move an unparseable record aside so the roadmap can be locked again.
    fn quarantine_record(&self, roadmap_id: &str) -> Result<()> {
        let from = self.record_path(roadmap_id);
        let to = self.quarantine_path(roadmap_id);
        fs::rename(&from, &to).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to quarantine lock record '{}': {}",
                from.display(),
                e
            ))
        })
    }

    fn write_record(&self, roadmap_id: &str, lock: &WriteLock) -> Result<()> {
        let json = serde_json::to_string_pretty(lock).map_err(|e| {
            RoadlockError::StoreError(format!("failed to serialize lock record: {}", e))
        })?;
        atomic_write_file(self.record_path(roadmap_id), &json)
    }

    fn delete_record(&self, roadmap_id: &str) -> Result<()> {
        let path = self.record_path(roadmap_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RoadlockError::StoreError(format!(
                "failed to delete lock record '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

enum RawRecord {
    Missing,
    Parsed(WriteLock),
    Corrupt(serde_json::Error),
}

impl LockStore for FileLockStore {
    fn get(&self, roadmap_id: &str) -> Result<Option<WriteLock>> {
        validate_roadmap_id(roadmap_id)?;
        Self::read_record(&self.record_path(roadmap_id))
    }

    fn compare_and_set(
        &self,
        roadmap_id: &str,
        expected: Option<&WriteLock>,
        new: Option<WriteLock>,
    ) -> Result<bool> {
        validate_roadmap_id(roadmap_id)?;
        self.ensure_dir()?;

        // A busy key reports interference rather than waiting.
        let guard_path = self.guard_path(roadmap_id);
        let Some(_guard) = KeyGuard::try_acquire(&guard_path, "compare_and_set")? else {
            let holder = GuardMetadata::from_file(&guard_path)
                .map(|meta| meta.owner)
                .unwrap_or_default();
            tracing::debug!(roadmap = roadmap_id, holder = %holder, "store guard busy");
            return Ok(false);
        };

        let current = Self::read_record(&self.record_path(roadmap_id))?;
        if current.as_ref() != expected {
            return Ok(false);
        }

        match new {
            Some(lock) => self.write_record(roadmap_id, &lock)?,
            None => self.delete_record(roadmap_id)?,
        }
        Ok(true)
    }

    fn remove(&self, roadmap_id: &str) -> Result<Option<WriteLock>> {
        validate_roadmap_id(roadmap_id)?;
        self.ensure_dir()?;

        let guard_path = self.guard_path(roadmap_id);
        for attempt in 0..REMOVE_GUARD_ATTEMPTS {
            if let Some(_guard) = KeyGuard::try_acquire(&guard_path, "remove")? {
                return match Self::read_raw(&self.record_path(roadmap_id))? {
                    RawRecord::Missing => Ok(None),
                    RawRecord::Parsed(lock) => {
                        self.delete_record(roadmap_id)?;
                        Ok(Some(lock))
                    }
                    RawRecord::Corrupt(e) => {
                        self.quarantine_record(roadmap_id)?;
                        tracing::warn!(
                            roadmap = roadmap_id,
                            error = %e,
                            quarantined = %self.quarantine_path(roadmap_id).display(),
                            "removed unreadable lock record"
                        );
                        Ok(None)
                    }
                };
            }
            if attempt + 1 < REMOVE_GUARD_ATTEMPTS {
                thread::sleep(std::time::Duration::from_millis(REMOVE_GUARD_BACKOFF_MS));
            }
        }

        Err(RoadlockError::Conflict(roadmap_id.to_string()))
    }

    fn list(&self) -> Result<Vec<WriteLock>> {
        let mut locks = Vec::new();

        if !self.dir.exists() {
            return Ok(locks);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to read locks directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                RoadlockError::StoreError(format!("failed to read locks directory entry: {}", e))
            })?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let is_hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if is_hidden {
                continue;
            }

            match Self::read_record(&path) {
                Ok(Some(lock)) => locks.push(lock),
                // Removed between read_dir and read.
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable lock record"
                    );
                }
            }
        }

        locks.sort_by(|a, b| a.roadmap_id.cmp(&b.roadmap_id));
        Ok(locks)
    }
}
