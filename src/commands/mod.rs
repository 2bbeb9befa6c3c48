//! Command implementations for avmux.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the event-log helper both commands share.

mod merge;
mod probe;

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::events::{self, Event};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Merge(args) => merge::cmd_merge(args),
        Command::Probe(args) => probe::cmd_probe(args),
    }
}

/// Append an event to the configured log, if any.
///
/// Logging never fails a merge; append errors are reported as warnings.
fn log_event(config: &Config, event: Event) {
    if let Some(path) = &config.event_log {
        if let Err(err) = events::append_event(path, &event) {
            eprintln!("warning: {}", err);
        }
    }
}
