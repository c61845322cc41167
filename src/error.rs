//! Error types for roadlock.
//!
//! Uses thiserror for derive macros. Lock-lifecycle failures carry enough
//! context for a caller to render "locked by X, retry in Yms" without a
//! second round trip to the store.

use crate::exit_codes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for roadlock operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoadlockError {
    /// Another user holds a live, non-stale lock on the roadmap.
    #[error(
        "roadmap '{roadmap_id}' is locked by {holder_name} ({holder_id}); retry in {expires_in_ms}ms"
    )]
    LockHeld {
        roadmap_id: String,
        holder_id: String,
        holder_name: String,
        expires_in_ms: i64,
    },

    /// The caller is not the current holder of the lock.
    #[error("roadmap '{roadmap_id}' is locked by {holder_id}, not by the caller")]
    NotHolder {
        roadmap_id: String,
        holder_id: String,
    },

    /// No lock exists for the roadmap.
    #[error("no write lock exists for roadmap '{0}'")]
    LockNotFound(String),

    /// The lock existed but its deadline has passed; the caller must re-acquire.
    #[error("write lock on roadmap '{roadmap_id}' expired at {expired_at}")]
    LockExpired {
        roadmap_id: String,
        expired_at: DateTime<Utc>,
    },

    /// A concurrent update won the compare-and-set race twice in a row.
    #[error("concurrent update on roadmap '{0}'; try again")]
    Conflict(String),

    /// The lock store could not be read or written.
    #[error("lock store failure: {0}")]
    StoreError(String),

    /// Invalid arguments, configuration, or environment.
    #[error("{0}")]
    UserError(String),
}

impl RoadlockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RoadlockError::LockHeld { .. } | RoadlockError::Conflict(_) => {
                exit_codes::LOCK_FAILURE
            }
            RoadlockError::NotHolder { .. }
            | RoadlockError::LockNotFound(_)
            | RoadlockError::LockExpired { .. } => exit_codes::OWNERSHIP_FAILURE,
            RoadlockError::StoreError(_) => exit_codes::STORE_FAILURE,
            RoadlockError::UserError(_) => exit_codes::USER_ERROR,
        }
    }

    /// Short machine-readable name of the error kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            RoadlockError::LockHeld { .. } => "lock_held",
            RoadlockError::NotHolder { .. } => "not_holder",
            RoadlockError::LockNotFound(_) => "lock_not_found",
            RoadlockError::LockExpired { .. } => "lock_expired",
            RoadlockError::Conflict(_) => "conflict",
            RoadlockError::StoreError(_) => "store_error",
            RoadlockError::UserError(_) => "user_error",
        }
    }
}

/// Result type alias for roadlock operations.
pub type Result<T> = std::result::Result<T, RoadlockError>;
