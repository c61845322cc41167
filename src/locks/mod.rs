//! Write-lock subsystem for roadlock.
//!
//! Guarantees that at most one user holds write access to a roadmap at a time:
//! - `acquire` grants a lock, renews the caller's own lock, or takes over a
//!   lock whose holder stopped heartbeating
//! - `heartbeat` keeps a held lock alive
//! - `release` hands the lock back (or force-removes it for recovery)
//! - `status` projects the current state for display
//!
//! # Liveness
//!
//! A lock is **stale** once `now - last_heartbeat` exceeds the staleness
//! threshold (default 3 minutes) and **expired** once `now > expires_at`
//! (`last_heartbeat + TTL`, default 5 minutes). Other users may take over a
//! stale or expired lock; expired locks are also reclaimed in the background
//! by [`crate::scheduler::ExpiryScheduler`].
//!
//! # Concurrency
//!
//! Every transition is a read followed by a compare-and-set on the one
//! roadmap key it concerns. A lost race is retried once and then reported as
//! [`crate::error::RoadlockError::Conflict`].

mod policy;
mod service;
mod types;


// Re-export public API
pub use policy::{
    DEFAULT_STALE_SECONDS, DEFAULT_TTL_SECONDS, LockPolicy, MIN_SWEEP_INTERVAL_MS, SWEEP_INTERVAL_DIVISOR, expires_in_ms,
};
pub use service::{Acquired, AcquireKind, CAS_RETRIES, LockService, ReleaseOutcome};
pub use types::{LockHolder, LockInfo, LockStatus, WriteLock, WriteLockView};
