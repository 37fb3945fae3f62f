// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the daemon lifecycle supervisor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("daemon already started")]
    AlreadyStarted,
    #[error("scrivener error: {0}")]
    Scrivener(#[from] coven_core::ScrivenerError),
}
