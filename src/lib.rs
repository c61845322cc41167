//! Roadlock: exclusive write locks for collaboratively edited roadmaps.
//!
//! At most one user holds write access to a roadmap at a time. Holders keep
//! their lock alive with heartbeats; a holder that stops heartbeating is
//! detected as stale and can be taken over, and locks past their deadline are
//! reclaimed by a background sweeper.
//!
//! The core is [`locks::LockService`] over any [`store::LockStore`] and
//! [`clock::Clock`], plus [`scheduler::ExpiryScheduler`] for reclamation.
//! The `roadlock` binary drives both against a file-backed store in a
//! `.roadlock/` state directory.

pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod scheduler;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
