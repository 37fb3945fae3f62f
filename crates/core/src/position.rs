// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal positions: dense, monotonic, strictly-positive integers.

use std::fmt;
use std::num::NonZeroU64;

/// The sentinel `after_position` meaning "before the first record".
pub const BEFORE_FIRST: u64 = 0;

/// A 1-based, dense, monotonic position assigned by a scrivener.
///
/// Position `0` is never assigned to a record; it is reserved as the
/// `after_position` sentinel meaning "before the first record" at the
/// `u64` API boundary (see `Scrivener::tail`, `Scrivener::wait_for`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(NonZeroU64);

impl Position {
    /// Construct the first position, `1`.
    pub const FIRST: Position = match NonZeroU64::new(1) {
        Some(n) => Position(n),
        None => unreachable!(),
    };

    /// Construct a `Position` from a raw `u64`. Returns `None` for `0`.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Position)
    }

    /// The next position after this one.
    pub fn next(self) -> Position {
        Position(self.0.saturating_add(1))
    }

    /// The raw `u64` value of this position.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Position> for u64 {
    fn from(p: Position) -> u64 {
        p.get()
    }
}

#[cfg(test)]
#[path = "position_tests.rs"]
mod tests;
