//! Timing policy shared by enforcement, status projection, and the sweeper.

use super::types::WriteLock;
use chrono::{DateTime, Duration, Utc};

/// Default lock time-to-live (5 minutes).
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Default staleness threshold (3 minutes).
pub const DEFAULT_STALE_SECONDS: u64 = 180;

/// Sweep interval divisor applied to the TTL when no interval is configured.
pub const SWEEP_INTERVAL_DIVISOR: i32 = 5;

/// Shortest sweep interval a policy will hold.
pub const MIN_SWEEP_INTERVAL_MS: i64 = 1;

/// TTL, staleness threshold, and sweep cadence for write locks.
///
/// Every staleness and expiry decision goes through this type so that
/// `status` never disagrees with `acquire` about whether a lock is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    ttl: Duration,
    stale_threshold: Duration,
    sweep_interval: Duration,
}

impl LockPolicy {
    /// Build a policy with the sweep interval defaulted to `ttl / 5`.
    pub fn new(ttl: Duration, stale_threshold: Duration) -> Self {
        Self {
            ttl,
            stale_threshold,
            sweep_interval: clamp_sweep_interval(ttl / SWEEP_INTERVAL_DIVISOR, ttl),
        }
    }

    /// Override the sweep interval.
    ///
    /// The interval is clamped to at least one millisecond and to strictly
    /// less than the TTL, so the sweeper neither spins nor lets an expired
    /// lock outlive a full TTL.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        let clamped = clamp_sweep_interval(interval, self.ttl);
        if clamped != interval {
            tracing::warn!(
                requested_ms = interval.num_milliseconds(),
                clamped_ms = clamped.num_milliseconds(),
                "sweep interval out of range; clamped"
            );
        }
        self.sweep_interval = clamped;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// `now - last_heartbeat > stale_threshold`. Exactly at the threshold is not stale.
    pub fn is_stale(&self, last_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_heartbeat) > self.stale_threshold
    }

    /// `now > expires_at`.
    pub fn is_expired(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now > expires_at
    }

    /// A lock nobody else may take over: neither expired nor stale.
    pub fn is_live(&self, lock: &WriteLock, now: DateTime<Utc>) -> bool {
        !self.is_expired(lock.expires_at, now) && !self.is_stale(lock.last_heartbeat, now)
    }

    /// Deadline for a lock renewed at `now`.
    pub fn deadline_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_TTL_SECONDS as i64),
            Duration::seconds(DEFAULT_STALE_SECONDS as i64),
        )
    }
}

fn clamp_sweep_interval(interval: Duration, ttl: Duration) -> Duration {
    let min = Duration::milliseconds(MIN_SWEEP_INTERVAL_MS);
    let max = (ttl - min).max(min);
    interval.clamp(min, max)
}

/// Milliseconds from `now` until `expires_at`, clamped at zero.
pub fn expires_in_ms(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    expires_at
        .signed_duration_since(now)
        .num_milliseconds()
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(ms)
    }

    #[test]
    fn default_policy_matches_documented_constants() {
        let policy = LockPolicy::default();
        assert_eq!(policy.ttl(), Duration::minutes(5));
        assert_eq!(policy.stale_threshold(), Duration::minutes(3));
        assert_eq!(policy.sweep_interval(), Duration::minutes(1));
        assert!(policy.sweep_interval() < policy.ttl());
    }

    #[test]
    fn stale_boundary_is_exclusive() {
        let policy = LockPolicy::default();
        assert!(!policy.is_stale(t(0), t(180_000)));
        assert!(policy.is_stale(t(0), t(180_001)));
        assert!(!policy.is_stale(t(0), t(0)));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let policy = LockPolicy::default();
        assert!(!policy.is_expired(t(300_000), t(300_000)));
        assert!(policy.is_expired(t(300_000), t(300_001)));
    }

    #[test]
    fn expires_in_is_clamped_at_zero() {
        assert_eq!(expires_in_ms(t(300_000), t(10_000)), 290_000);
        assert_eq!(expires_in_ms(t(300_000), t(300_000)), 0);
        assert_eq!(expires_in_ms(t(300_000), t(400_000)), 0);
    }

    #[test]
    fn custom_sweep_interval_overrides_default() {
        let policy = LockPolicy::new(Duration::seconds(10), Duration::seconds(6))
            .with_sweep_interval(Duration::milliseconds(500));
        assert_eq!(policy.sweep_interval(), Duration::milliseconds(500));
        assert_eq!(policy.deadline_from(t(0)), t(10_000));
    }

    #[test]
    fn sweep_interval_is_clamped_into_range() {
        let policy = LockPolicy::new(Duration::seconds(10), Duration::seconds(6));

        let zero = policy.with_sweep_interval(Duration::zero());
        assert_eq!(zero.sweep_interval(), Duration::milliseconds(1));

        let negative = policy.with_sweep_interval(Duration::seconds(-5));
        assert_eq!(negative.sweep_interval(), Duration::milliseconds(1));

        let too_long = policy.with_sweep_interval(Duration::minutes(1));
        assert_eq!(too_long.sweep_interval(), Duration::milliseconds(9_999));
        assert!(too_long.sweep_interval() < too_long.ttl());
    }

    #[test]
    fn default_sweep_interval_is_never_zero() {
        let policy = LockPolicy::new(Duration::zero(), Duration::zero());
        assert_eq!(policy.sweep_interval(), Duration::milliseconds(1));
    }
}
