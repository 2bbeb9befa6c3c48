//! Event logging for avmux.
//!
//! Merge and probe runs can be recorded to an append-only NDJSON log (one
//! JSON object per line) for later inspection. Logging is opt-in via the
//! `event_log` config field and never blocks a merge: callers treat append
//! failures as warnings.
//!
//! Each event carries:
//! - `ts`: RFC3339 timestamp
//! - `action`: probe, merge_start, merge_complete, merge_failed
//! - `actor`: the invoking user (e.g. `user@HOST`)
//! - `details`: freeform object with action-specific fields

use crate::error::{AvmuxError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// FFmpeg binary sanity probe.
    Probe,
    /// Merge run started.
    MergeStart,
    /// Merge run finished successfully.
    MergeComplete,
    /// Merge run failed.
    MergeFailed,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Probe => write!(f, "probe"),
            EventAction::MergeStart => write!(f, "merge_start"),
            EventAction::MergeComplete => write!(f, "merge_complete"),
            EventAction::MergeFailed => write!(f, "merge_failed"),
        }
    }
}

/// An event record for the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g. `user@HOST`).
    pub actor: String,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action.
    ///
    /// The timestamp is set to the current time, and the actor is
    /// determined from the environment (USER@HOSTNAME).
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AvmuxError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the log at `path` as a single JSON line.
///
/// The file and its parent directory are created on first use.
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                AvmuxError::UserError(format!(
                    "failed to create event log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            AvmuxError::UserError(format!(
                "failed to open event log '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        AvmuxError::UserError(format!(
            "failed to write to event log '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}
