// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the file-backed scrivener and flush sinks.

use coven_core::ScrivenerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not acquire journal lock at {0}")]
    LockContention(std::path::PathBuf),
    #[error("scrivener error: {0}")]
    Scrivener(#[from] ScrivenerError),
}

impl From<StorageError> for ScrivenerError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Scrivener(e) => e,
            other => ScrivenerError::InvalidArgument(other.to_string()),
        }
    }
}

/// Lets a windowing/shattering/flusher pump route a storage failure
/// through `Daemon::fail` without `coven-core` depending on
/// `coven-storage` (the orphan rule lets this live here, since
/// `StorageError` is local to this crate).
impl From<StorageError> for coven_core::DaemonFailure {
    fn from(error: StorageError) -> Self {
        coven_core::DaemonFailure::Storage(error.to_string())
    }
}

/// Same orphan-rule reasoning as above, for the narrower `SinkError`
/// the flusher daemon's `FlushSink` trait returns.
impl From<crate::sink::SinkError> for coven_core::DaemonFailure {
    fn from(error: crate::sink::SinkError) -> Self {
        coven_core::DaemonFailure::Storage(error.to_string())
    }
}
