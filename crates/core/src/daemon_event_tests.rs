// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn status_ordering_is_monotonic() {
    assert!(DaemonStatus::Stopped < DaemonStatus::Running);
    assert!(DaemonStatus::Running < DaemonStatus::Completed);
}

#[test]
fn status_changed_reports_its_status() {
    let event = DaemonEvent::StatusChanged {
        status: DaemonStatus::Running,
    };
    assert_eq!(event.status(), Some(DaemonStatus::Running));
    assert_eq!(event.failure(), None);
}

#[test]
fn failure_occurred_reports_no_status() {
    let event = DaemonEvent::FailureOccurred {
        error: DaemonFailure::custom("boom"),
    };
    assert_eq!(event.status(), None);
    assert!(event.failure().is_some());
}

#[test]
fn round_trips_through_json() {
    let event = DaemonEvent::StatusChanged {
        status: DaemonStatus::Completed,
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: DaemonEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(event, back);
}

#[test]
fn scrivener_error_converts_to_failure() {
    let err = crate::ScrivenerError::Cancelled;
    let failure: DaemonFailure = err.into();
    assert!(matches!(failure, DaemonFailure::Scrivener(_)));
}
