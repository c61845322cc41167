//! Config struct definition and default implementation.

use crate::locks::{DEFAULT_STALE_SECONDS, DEFAULT_TTL_SECONDS};
use serde::{Deserialize, Serialize};

/// Configuration for the lock manager.
///
/// This struct represents the contents of `.roadlock/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock timing
    // =========================================================================
    /// Seconds a lock stays valid after its last heartbeat.
    #[serde(default = "default_lock_ttl_seconds")]
    pub lock_ttl_seconds: u64,

    /// Seconds without a heartbeat after which another user may take over.
    #[serde(default = "default_lock_stale_seconds")]
    pub lock_stale_seconds: u64,

    /// Interval between expiry sweeps. Defaults to a fifth of the TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_interval_ms: Option<u64>,

    // =========================================================================
    // Audit
    // =========================================================================
    /// Whether lock commands append to the events log.
    #[serde(default = "default_true")]
    pub audit_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_ttl_seconds: default_lock_ttl_seconds(),
            lock_stale_seconds: default_lock_stale_seconds(),
            sweep_interval_ms: None,
            audit_log: default_true(),
        }
    }
}

fn default_lock_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_lock_stale_seconds() -> u64 {
    DEFAULT_STALE_SECONDS
}

fn default_true() -> bool {
    true
}
