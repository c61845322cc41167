//! Audit log for lock transitions.
//!
//! Events are stored in NDJSON format (one JSON object per line) in
//! `.roadlock/events/events.ndjson`.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (acquire, heartbeat, release, reclaim, ...)
//! - `actor`: The owner string of the process (e.g., `user@HOST`)
//! - `roadmap`: Optional roadmap id for lock events
//! - `details`: Freeform object with action-specific details
//!
//! The log is a record, not the source of truth: lock state lives in the
//! store, and commands treat a failed append as a warning.
//!
//! ```no_run
//! use roadlock::context::RoadlockContext;
//! use roadlock::events::{Event, EventAction, append_event};
//! use serde_json::json;
//!
//! let ctx = RoadlockContext::resolve()?;
//! let event = Event::new(EventAction::Acquire)
//!     .with_roadmap("q3-roadmap")
//!     .with_details(json!({"user_id": "alice"}));
//! append_event(&ctx, &event)?;
//! # Ok::<(), roadlock::error::RoadlockError>(())
//! ```

use crate::context::RoadlockContext;
use crate::error::{Result, RoadlockError};
use crate::store::owner_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// State directory created
    Init,
    /// Fresh lock granted on an unlocked roadmap
    Acquire,
    /// Holder re-acquired its own lock
    Renew,
    /// Stale or expired lock replaced by another user
    Takeover,
    /// Holder extended its lock
    Heartbeat,
    /// Holder released its lock
    Release,
    /// Lock removed regardless of holder
    ForceRelease,
    /// Expired lock removed by the sweeper
    Reclaim,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Init => write!(f, "init"),
            EventAction::Acquire => write!(f, "acquire"),
            EventAction::Renew => write!(f, "renew"),
            EventAction::Takeover => write!(f, "takeover"),
            EventAction::Heartbeat => write!(f, "heartbeat"),
            EventAction::Release => write!(f, "release"),
            EventAction::ForceRelease => write!(f, "force_release"),
            EventAction::Reclaim => write!(f, "reclaim"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The process owner that performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Roadmap the event concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action, stamped with the current time.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: owner_string(),
            roadmap: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Override the timestamp, e.g. with the lock service's clock.
    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = ts;
        self
    }

    pub fn with_roadmap(mut self, roadmap_id: impl Into<String>) -> Self {
        self.roadmap = Some(roadmap_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            RoadlockError::StoreError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Append an event to the events log.
///
/// The file and its directory are created if missing. Each append writes one
/// line with a trailing newline.
pub fn append_event(ctx: &RoadlockContext, event: &Event) -> Result<()> {
    let events_file = ctx.events_file();
    let json_line = event.to_ndjson_line()?;

    let events_dir = ctx.events_dir();
    if !events_dir.exists() {
        fs::create_dir_all(&events_dir).map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to create events directory '{}': {}",
                events_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            RoadlockError::StoreError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        RoadlockError::StoreError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        RoadlockError::StoreError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Append an event, downgrading failure to a logged warning.
pub fn record_event(ctx: &RoadlockContext, event: &Event) {
    if let Err(e) = append_event(ctx, event) {
        tracing::warn!(action = %event.action, error = %e, "failed to append audit event");
    }
}
