// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the scrivener contract.

use thiserror::Error;

/// Errors surfaced directly to a scrivener's caller.
///
/// Background-pump errors (file IO, daemon failures) are a separate
/// taxonomy; see `coven_storage::StorageError` and
/// `coven_daemon::DaemonFailure`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScrivenerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("operation cancelled")]
    Cancelled,
}
