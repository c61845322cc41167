//! Write-lock records and the projections handed to callers.

use super::policy::{LockPolicy, expires_in_ms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current write ownership of one roadmap.
///
/// Serialized in the camelCase shape roadmap clients already consume;
/// the holder fields appear as `userId`/`userName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteLock {
    /// Lock instance id. Regenerated on every fresh grant, kept across renewals.
    pub id: Uuid,

    pub roadmap_id: String,

    #[serde(rename = "userId")]
    pub holder_id: String,

    #[serde(rename = "userName")]
    pub holder_name: String,

    pub acquired_at: DateTime<Utc>,

    pub last_heartbeat: DateTime<Utc>,

    /// Absolute deadline; the lock is invalid past this instant.
    pub expires_at: DateTime<Utc>,
}

impl WriteLock {
    /// Fresh grant to `holder` at `now`.
    pub fn grant(
        roadmap_id: &str,
        holder: &LockHolder,
        now: DateTime<Utc>,
        policy: &LockPolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            roadmap_id: roadmap_id.to_string(),
            holder_id: holder.user_id.clone(),
            holder_name: holder.user_name.clone(),
            acquired_at: now,
            last_heartbeat: now,
            expires_at: policy.deadline_from(now),
        }
    }

    /// Copy of this lock renewed at `now`. `id` and `acquired_at` are kept.
    pub fn renewed(&self, now: DateTime<Utc>, policy: &LockPolicy) -> Self {
        Self {
            last_heartbeat: now,
            expires_at: policy.deadline_from(now),
            ..self.clone()
        }
    }

    pub fn is_held_by(&self, user_id: &str) -> bool {
        self.holder_id == user_id
    }

    pub fn holder(&self) -> LockHolder {
        LockHolder {
            user_id: self.holder_id.clone(),
            user_name: self.holder_name.clone(),
        }
    }

    /// Wire projection with `expiresIn` computed at `now`.
    pub fn view(&self, now: DateTime<Utc>) -> WriteLockView {
        WriteLockView {
            lock: self.clone(),
            expires_in: expires_in_ms(self.expires_at, now),
        }
    }
}

/// Identity of a lock holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockHolder {
    pub user_id: String,
    pub user_name: String,
}

impl LockHolder {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// A lock plus milliseconds until it expires, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteLockView {
    #[serde(flatten)]
    pub lock: WriteLock,

    /// Milliseconds until `expires_at`, never negative.
    pub expires_in: i64,
}

/// Read-only lock state for UI display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub is_locked: bool,
    pub is_own_lock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_holder: Option<LockHolder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl LockStatus {
    pub fn unlocked() -> Self {
        Self {
            is_locked: false,
            is_own_lock: false,
            lock_holder: None,
            expires_in: None,
        }
    }
}

/// A stored lock annotated with its liveness at a given instant.
#[derive(Debug, Clone)]
pub struct LockInfo {
    pub lock: WriteLock,
    pub is_stale: bool,
    pub is_expired: bool,
    pub expires_in: i64,
}

impl LockInfo {
    pub fn evaluate(lock: WriteLock, now: DateTime<Utc>, policy: &LockPolicy) -> Self {
        Self {
            is_stale: policy.is_stale(lock.last_heartbeat, now),
            is_expired: policy.is_expired(lock.expires_at, now),
            expires_in: expires_in_ms(lock.expires_at, now),
            lock,
        }
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (holder: {} <{}>, expires in {}ms{})",
            self.lock.roadmap_id,
            self.lock.holder_name,
            self.lock.holder_id,
            self.expires_in,
            if self.is_expired {
                ", EXPIRED"
            } else if self.is_stale {
                ", STALE"
            } else {
                ""
            }
        )
    }
}
