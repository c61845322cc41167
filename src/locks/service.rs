//! Acquire / heartbeat / release / status over a [`LockStore`].

use super::policy::{LockPolicy, expires_in_ms};
use super::types::{LockHolder, LockInfo, LockStatus, WriteLock};
use crate::clock::Clock;
use crate::error::{Result, RoadlockError};
use crate::store::{LockStore, validate_roadmap_id};
use chrono::{DateTime, Utc};

/// Extra compare-and-set attempts after the first one loses a race.
pub const CAS_RETRIES: u32 = 1;

/// How an `acquire` call obtained the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireKind {
    /// No lock existed, or the caller's own lock had expired.
    Granted,
    /// The caller already held the lock; its deadline was extended.
    Renewed,
    /// Another user's stale or expired lock was replaced.
    TakenOver {
        previous: LockHolder,
        was_expired: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub lock: WriteLock,
    pub kind: AcquireKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The lock was removed.
    Released { lock: WriteLock, forced: bool },
    /// Nothing to release.
    NotLocked,
}

/// The lock manager.
///
/// Performs no authorization of its own: callers must have checked that the
/// user may edit (or, for forced release, administer) the roadmap.
pub struct LockService<S, C> {
    store: S,
    clock: C,
    policy: LockPolicy,
}

impl<S: LockStore, C: Clock> LockService<S, C> {
    pub fn new(store: S, clock: C, policy: LockPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn policy(&self) -> &LockPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Grant or renew write access to `roadmap_id` for `holder`.
    ///
    /// - absent lock, or the caller's own expired lock: fresh grant
    /// - lock held by the caller and not expired: deadline extended, `acquired_at` kept
    /// - expired or stale lock held by someone else: takeover
    /// - live lock held by someone else: [`RoadlockError::LockHeld`]
    pub fn acquire(&self, roadmap_id: &str, holder: &LockHolder) -> Result<Acquired> {
        validate_roadmap_id(roadmap_id)?;
        validate_holder(holder)?;

        for attempt in 0..=CAS_RETRIES {
            let now = self.clock.now();
            let current = self.store.get(roadmap_id)?;

            let (next, kind) = match &current {
                None => (
                    WriteLock::grant(roadmap_id, holder, now, &self.policy),
                    AcquireKind::Granted,
                ),
                Some(lock)
                    if lock.is_held_by(&holder.user_id)
                        && !self.policy.is_expired(lock.expires_at, now) =>
                {
                    (lock.renewed(now, &self.policy), AcquireKind::Renewed)
                }
                Some(lock) if lock.is_held_by(&holder.user_id) => (
                    WriteLock::grant(roadmap_id, holder, now, &self.policy),
                    AcquireKind::Granted,
                ),
                Some(lock) if self.policy.is_live(lock, now) => {
                    tracing::info!(
                        roadmap = roadmap_id,
                        requester = %holder.user_id,
                        holder = %lock.holder_id,
                        "write lock held by another user"
                    );
                    return Err(RoadlockError::LockHeld {
                        roadmap_id: roadmap_id.to_string(),
                        holder_id: lock.holder_id.clone(),
                        holder_name: lock.holder_name.clone(),
                        expires_in_ms: expires_in_ms(lock.expires_at, now),
                    });
                }
                Some(lock) => (
                    WriteLock::grant(roadmap_id, holder, now, &self.policy),
                    AcquireKind::TakenOver {
                        previous: lock.holder(),
                        was_expired: self.policy.is_expired(lock.expires_at, now),
                    },
                ),
            };

            if self
                .store
                .compare_and_set(roadmap_id, current.as_ref(), Some(next.clone()))?
            {
                tracing::debug!(
                    roadmap = roadmap_id,
                    holder = %holder.user_id,
                    kind = ?kind,
                    expires_at = %next.expires_at,
                    "write lock acquired"
                );
                return Ok(Acquired { lock: next, kind });
            }

            tracing::debug!(roadmap = roadmap_id, attempt, "acquire lost compare-and-set race");
        }

        Err(RoadlockError::Conflict(roadmap_id.to_string()))
    }

    /// Extend the lock held by `user_id`.
    pub fn heartbeat(&self, roadmap_id: &str, user_id: &str) -> Result<WriteLock> {
        validate_roadmap_id(roadmap_id)?;

        for attempt in 0..=CAS_RETRIES {
            let now = self.clock.now();
            let Some(lock) = self.store.get(roadmap_id)? else {
                return Err(RoadlockError::LockNotFound(roadmap_id.to_string()));
            };

            if !lock.is_held_by(user_id) {
                return Err(RoadlockError::NotHolder {
                    roadmap_id: roadmap_id.to_string(),
                    holder_id: lock.holder_id,
                });
            }

            if self.policy.is_expired(lock.expires_at, now) {
                return Err(RoadlockError::LockExpired {
                    roadmap_id: roadmap_id.to_string(),
                    expired_at: lock.expires_at,
                });
            }

            let renewed = lock.renewed(now, &self.policy);
            if self
                .store
                .compare_and_set(roadmap_id, Some(&lock), Some(renewed.clone()))?
            {
                tracing::debug!(
                    roadmap = roadmap_id,
                    holder = user_id,
                    expires_at = %renewed.expires_at,
                    "heartbeat"
                );
                return Ok(renewed);
            }

            tracing::debug!(roadmap = roadmap_id, attempt, "heartbeat lost compare-and-set race");
        }

        Err(RoadlockError::Conflict(roadmap_id.to_string()))
    }

    /// Release the lock on `roadmap_id`.
    ///
    /// Without `force`, only the holder may release. With `force` the lock is
    /// removed whoever holds it. Releasing an absent lock succeeds.
    pub fn release(
        &self,
        roadmap_id: &str,
        user_id: &str,
        force: bool,
    ) -> Result<ReleaseOutcome> {
        validate_roadmap_id(roadmap_id)?;

        if force {
            return Ok(match self.store.remove(roadmap_id)? {
                Some(lock) => {
                    tracing::info!(
                        roadmap = roadmap_id,
                        by = user_id,
                        holder = %lock.holder_id,
                        "write lock force-released"
                    );
                    ReleaseOutcome::Released { lock, forced: true }
                }
                None => ReleaseOutcome::NotLocked,
            });
        }

        for attempt in 0..=CAS_RETRIES {
            let Some(lock) = self.store.get(roadmap_id)? else {
                return Ok(ReleaseOutcome::NotLocked);
            };

            if !lock.is_held_by(user_id) {
                return Err(RoadlockError::NotHolder {
                    roadmap_id: roadmap_id.to_string(),
                    holder_id: lock.holder_id,
                });
            }

            if self.store.compare_and_set(roadmap_id, Some(&lock), None)? {
                tracing::debug!(roadmap = roadmap_id, holder = user_id, "write lock released");
                return Ok(ReleaseOutcome::Released {
                    lock,
                    forced: false,
                });
            }

            tracing::debug!(roadmap = roadmap_id, attempt, "release lost compare-and-set race");
        }

        Err(RoadlockError::Conflict(roadmap_id.to_string()))
    }

    /// Lock state as seen by `caller_id`.
    ///
    /// A roadmap counts as locked when its lock would block `caller_id` or
    /// belongs to `caller_id` and can still be renewed; this mirrors the rules
    /// `acquire` and `heartbeat` enforce.
    pub fn status(&self, roadmap_id: &str, caller_id: &str) -> Result<LockStatus> {
        validate_roadmap_id(roadmap_id)?;

        let now = self.clock.now();
        let Some(lock) = self.store.get(roadmap_id)? else {
            return Ok(LockStatus::unlocked());
        };

        let is_own_lock = lock.is_held_by(caller_id);
        let is_locked = if is_own_lock {
            !self.policy.is_expired(lock.expires_at, now)
        } else {
            self.policy.is_live(&lock, now)
        };

        if !is_locked {
            return Ok(LockStatus::unlocked());
        }

        Ok(LockStatus {
            is_locked: true,
            is_own_lock,
            lock_holder: Some(lock.holder()),
            expires_in: Some(expires_in_ms(lock.expires_at, now)),
        })
    }

    /// Every stored lock with its liveness at the current instant.
    pub fn list(&self) -> Result<Vec<LockInfo>> {
        let now = self.clock.now();
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|lock| LockInfo::evaluate(lock, now, &self.policy))
            .collect())
    }
}

fn validate_holder(holder: &LockHolder) -> Result<()> {
    if holder.user_id.trim().is_empty() {
        return Err(RoadlockError::UserError(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(())
}
