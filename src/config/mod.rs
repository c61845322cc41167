//! Configuration model for roadlock.
//!
//! This module defines the Config struct that represents `.roadlock/config.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! defaults for every field, and validation of the lock timing values.

mod model;
mod operations;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub use operations::MAX_LOCK_TTL_SECONDS;
