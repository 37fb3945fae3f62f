// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle status and the events published as it transitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The supervised lifecycle of a daemon.
///
/// Transitions form a monotonic, non-branching path:
/// `Stopped -> Running -> Completed`. `Running -> Stopped` is
/// forbidden; a daemon that needs to run again is a new daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonStatus {
    Stopped,
    Running,
    Completed,
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DaemonStatus::Stopped => "stopped",
            DaemonStatus::Running => "running",
            DaemonStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// An error surfaced by a daemon's pump, published via `FailureOccurred`
/// at most once per daemon instance before the daemon transitions to
/// `Completed`.
///
/// Daemons that wrap a lower-level error (e.g. a storage or scrivener
/// failure) convert it with `From`; daemons whose failure originates in
/// caller-supplied policy/transmuter code use `Custom`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaemonFailure {
    #[error("scrivener error: {0}")]
    Scrivener(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    Custom(String),
}

impl DaemonFailure {
    pub fn custom(message: impl Into<String>) -> Self {
        DaemonFailure::Custom(message.into())
    }
}

impl From<crate::ScrivenerError> for DaemonFailure {
    fn from(err: crate::ScrivenerError) -> Self {
        DaemonFailure::Scrivener(err.to_string())
    }
}

/// Entries written to a daemon's event journal.
///
/// `StatusChanged` is published exactly once per transition;
/// `FailureOccurred` is published at most once per daemon instance and
/// always precedes the final `StatusChanged(Completed)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonEvent {
    #[serde(rename = "status_changed")]
    StatusChanged { status: DaemonStatus },
    #[serde(rename = "failure_occurred")]
    FailureOccurred { error: DaemonFailure },
}

impl DaemonEvent {
    /// The status this event implies, for `wait_for(status)` comparisons.
    /// `FailureOccurred` does not itself imply a status.
    pub fn status(&self) -> Option<DaemonStatus> {
        match self {
            DaemonEvent::StatusChanged { status } => Some(*status),
            DaemonEvent::FailureOccurred { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&DaemonFailure> {
        match self {
            DaemonEvent::FailureOccurred { error } => Some(error),
            DaemonEvent::StatusChanged { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "daemon_event_tests.rs"]
mod tests;
