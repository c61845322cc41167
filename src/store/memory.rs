//! In-process lock store.

use super::LockStore;
use crate::error::Result;
use crate::locks::WriteLock;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Sharded in-memory store.
///
/// Each compare-and-set runs under the write lock of the one shard holding the
/// key, so unrelated roadmaps proceed in parallel.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    locks: DashMap<String, WriteLock>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl LockStore for MemoryLockStore {
    fn get(&self, roadmap_id: &str) -> Result<Option<WriteLock>> {
        Ok(self.locks.get(roadmap_id).map(|entry| entry.value().clone()))
    }

    fn compare_and_set(
        &self,
        roadmap_id: &str,
        expected: Option<&WriteLock>,
        new: Option<WriteLock>,
    ) -> Result<bool> {
        match self.locks.entry(roadmap_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if expected != Some(occupied.get()) {
                    return Ok(false);
                }
                match new {
                    Some(lock) => {
                        occupied.insert(lock);
                    }
                    None => {
                        occupied.remove();
                    }
                }
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                if expected.is_some() {
                    return Ok(false);
                }
                if let Some(lock) = new {
                    vacant.insert(lock);
                }
                Ok(true)
            }
        }
    }

    fn remove(&self, roadmap_id: &str) -> Result<Option<WriteLock>> {
        Ok(self.locks.remove(roadmap_id).map(|(_, lock)| lock))
    }

    fn list(&self) -> Result<Vec<WriteLock>> {
        let mut locks: Vec<WriteLock> = self
            .locks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        locks.sort_by(|a, b| a.roadmap_id.cmp(&b.roadmap_id));
        Ok(locks)
    }
}
