// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// No forward, type-matching, fenced candidate exists and the
    /// current value does not satisfy the ritual's target type.
    #[error("no forward-reachable block accepts the current value, and it does not satisfy the ritual's target type")]
    NoProgress,
}
