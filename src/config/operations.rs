//! Config loading, validation, and conversion into lock policy.

use super::model::Config;
use crate::error::{Result, RoadlockError};
use crate::locks::LockPolicy;
use chrono::Duration;
use std::path::Path;

/// Upper bound on the configurable TTL (one week).
pub const MAX_LOCK_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(RoadlockError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            RoadlockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config, falling back to defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            RoadlockError::UserError(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            RoadlockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_ttl_seconds` and `lock_stale_seconds` must be positive
    /// - `lock_ttl_seconds` must not exceed [`MAX_LOCK_TTL_SECONDS`]
    /// - `lock_stale_seconds` must not exceed `lock_ttl_seconds`
    /// - `sweep_interval_ms`, when set, must be positive and shorter than the TTL
    pub fn validate(&self) -> Result<()> {
        if self.lock_ttl_seconds == 0 {
            return Err(invalid("lock_ttl_seconds must be greater than 0"));
        }

        if self.lock_ttl_seconds > MAX_LOCK_TTL_SECONDS {
            return Err(RoadlockError::UserError(format!(
                "config validation failed: lock_ttl_seconds must be at most {}",
                MAX_LOCK_TTL_SECONDS
            )));
        }

        if self.lock_stale_seconds == 0 {
            return Err(invalid("lock_stale_seconds must be greater than 0"));
        }

        if self.lock_stale_seconds > self.lock_ttl_seconds {
            return Err(RoadlockError::UserError(format!(
                "config validation failed: lock_stale_seconds ({}) must not exceed lock_ttl_seconds ({})",
                self.lock_stale_seconds, self.lock_ttl_seconds
            )));
        }

        if let Some(interval) = self.sweep_interval_ms {
            if interval == 0 {
                return Err(invalid("sweep_interval_ms must be greater than 0"));
            }
            if interval >= self.lock_ttl_seconds.saturating_mul(1000) {
                return Err(RoadlockError::UserError(format!(
                    "config validation failed: sweep_interval_ms ({}) must be shorter than the lock TTL ({}s)",
                    interval, self.lock_ttl_seconds
                )));
            }
        }

        Ok(())
    }

    /// Lock timing shared by the service and the scheduler.
    pub fn policy(&self) -> LockPolicy {
        let policy = LockPolicy::new(
            seconds(self.lock_ttl_seconds),
            seconds(self.lock_stale_seconds),
        );
        match self.sweep_interval_ms {
            Some(ms) => policy.with_sweep_interval(
                Duration::try_milliseconds(saturating_i64(ms)).unwrap_or(Duration::MAX),
            ),
            None => policy,
        }
    }
}

fn invalid(message: &str) -> RoadlockError {
    RoadlockError::UserError(format!("config validation failed: {}", message))
}

fn seconds(value: u64) -> Duration {
    Duration::try_seconds(saturating_i64(value)).unwrap_or(Duration::MAX)
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
