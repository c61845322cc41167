//! Lock storage backends.
//!
//! A [`LockStore`] maps `roadmap_id → WriteLock` and offers per-key atomic
//! compare-and-set. Operations on different roadmaps never contend with each
//! other; there is no store-wide lock.
//!
//! - [`MemoryLockStore`]: sharded in-process map, for embedding the service
//!   in a long-running server.
//! - [`FileLockStore`]: one JSON record per roadmap on disk, shared by every
//!   process pointed at the same state directory.

mod file;
mod guard;
mod memory;

pub use file::FileLockStore;
pub use guard::{GuardMetadata, KeyGuard, owner_string};
pub use memory::MemoryLockStore;

use crate::error::{Result, RoadlockError};
use crate::locks::WriteLock;
use std::sync::Arc;

/// Maximum length of a roadmap identifier.
pub const MAX_ROADMAP_ID_LEN: usize = 128;

/// Storage for at most one lock record per roadmap.
pub trait LockStore: Send + Sync {
    /// Current lock for the roadmap, if any. No side effects.
    fn get(&self, roadmap_id: &str) -> Result<Option<WriteLock>>;

    /// Replace the stored value with `new` only if it still equals `expected`.
    ///
    /// `None` on either side means "absent": `expected = None` installs into an
    /// empty slot, `new = None` deletes. Returns `Ok(false)` when the stored
    /// value changed underneath the caller, or when the key is momentarily
    /// busy; callers decide whether to retry.
    fn compare_and_set(
        &self,
        roadmap_id: &str,
        expected: Option<&WriteLock>,
        new: Option<WriteLock>,
    ) -> Result<bool>;

    /// Unconditional delete. Returns the removed lock, if there was one.
    fn remove(&self, roadmap_id: &str) -> Result<Option<WriteLock>>;

    /// Snapshot of every stored lock, ordered by roadmap id.
    fn list(&self) -> Result<Vec<WriteLock>>;
}

impl<S: LockStore + ?Sized> LockStore for Arc<S> {
    fn get(&self, roadmap_id: &str) -> Result<Option<WriteLock>> {
        (**self).get(roadmap_id)
    }

    fn compare_and_set(
        &self,
        roadmap_id: &str,
        expected: Option<&WriteLock>,
        new: Option<WriteLock>,
    ) -> Result<bool> {
        (**self).compare_and_set(roadmap_id, expected, new)
    }

    fn remove(&self, roadmap_id: &str) -> Result<Option<WriteLock>> {
        (**self).remove(roadmap_id)
    }

    fn list(&self) -> Result<Vec<WriteLock>> {
        (**self).list()
    }
}

/// Check that a roadmap identifier is usable as a store key and a file name.
///
/// Rules: non-empty, at most [`MAX_ROADMAP_ID_LEN`] characters, only ASCII
/// alphanumerics, `-`, `_` and `.`, and no leading `.`.
pub fn validate_roadmap_id(roadmap_id: &str) -> Result<()> {
    if roadmap_id.is_empty() {
        return Err(RoadlockError::UserError(
            "roadmap id must not be empty".to_string(),
        ));
    }

    if roadmap_id.len() > MAX_ROADMAP_ID_LEN {
        return Err(RoadlockError::UserError(format!(
            "roadmap id must be at most {} characters (got {})",
            MAX_ROADMAP_ID_LEN,
            roadmap_id.len()
        )));
    }

    if roadmap_id.starts_with('.') {
        return Err(RoadlockError::UserError(format!(
            "roadmap id '{}' must not start with '.'",
            roadmap_id
        )));
    }

    if let Some(bad) = roadmap_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(RoadlockError::UserError(format!(
            "roadmap id '{}' contains invalid character '{}'",
            roadmap_id, bad
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_ids() {
        for id in ["q3-plan", "roadmap_42", "a", "3f2c.v2", "550e8400-e29b-41d4"] {
            assert!(validate_roadmap_id(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_empty_and_hidden_ids() {
        assert!(validate_roadmap_id("").is_err());
        assert!(validate_roadmap_id(".hidden").is_err());
        assert!(validate_roadmap_id("..").is_err());
    }

    #[test]
    fn rejects_path_separators() {
        let err = validate_roadmap_id("../etc/passwd").unwrap_err();
        assert!(matches!(err, RoadlockError::UserError(_)));

        let err = validate_roadmap_id("a/b").unwrap_err();
        assert!(err.to_string().contains("invalid character '/'"));
    }

    #[test]
    fn rejects_overlong_ids() {
        let id = "r".repeat(MAX_ROADMAP_ID_LEN + 1);
        assert!(validate_roadmap_id(&id).is_err());
        assert!(validate_roadmap_id(&id[..MAX_ROADMAP_ID_LEN]).is_ok());
    }
}
