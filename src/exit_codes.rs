//! Exit code constants for the roadlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, uninitialized state directory)
//! - 2: Store failure (lock records could not be read or written)
//! - 3: Ownership failure (not the holder, lock missing, lock expired)
//! - 4: Lock contention (held by someone else, compare-and-set race lost)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or missing state directory.
pub const USER_ERROR: i32 = 1;

/// Store failure: the lock store could not be read or written.
pub const STORE_FAILURE: i32 = 2;

/// Ownership failure: caller does not (or no longer) hold the lock.
pub const OWNERSHIP_FAILURE: i32 = 3;

/// Lock contention: another user holds the lock, or a concurrent update won.
pub const LOCK_FAILURE: i32 = 4;
