// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the storage crate.
//!
//! Mirrors the accessor-module convention used for `OJ_STATE_DIR` /
//! `OJ_TIMER_CHECK_MS` elsewhere in this workspace: a pure function per
//! setting, unit-tested under `#[serial_test::serial]` since they read
//! shared process environment.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Overrides the bounded poll interval raced against the directory
/// watch in `FileScrivener::tail` and `ReadBackward`'s retry path.
pub fn scrivener_poll_interval() -> Duration {
    std::env::var("COVEN_SCRIVENER_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Resolve the default root directory for file-backed scriveners
/// created without an explicit path: `COVEN_SCRIVENER_DIR` >
/// `XDG_STATE_HOME/coven` > `~/.local/state/coven`.
pub fn default_scrivener_root() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("COVEN_SCRIVENER_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("coven"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/coven"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
