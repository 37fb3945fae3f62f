// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure, side-effect-free policy contracts shared by the windowing,
//! shattering, and flusher daemons, plus a small set of combinators
//! callers compose rather than hand-roll.

use std::time::Instant;

use coven_core::Record;

/// A snapshot of a windowing daemon's pending buffer, handed to
/// `WindowPolicy::should_emit`. Never mutated by a policy.
#[derive(Debug, Clone)]
pub struct StreamWindow<C> {
    pub pending: Vec<Record<C>>,
    pub total_observed: u64,
    pub window_start: Instant,
    pub last_emit: Instant,
}

impl<C> StreamWindow<C> {
    pub fn new(now: Instant) -> Self {
        Self {
            pending: Vec::new(),
            total_observed: 0,
            window_start: now,
            last_emit: now,
        }
    }
}

/// The result of transmuting a buffer of chunks into one coarser
/// output, with an optional carried-forward remainder.
#[derive(Debug, Clone)]
pub struct TransmuteOutcome<O, C> {
    pub output: O,
    pub remainder: Option<C>,
}

/// Decides when a windowing daemon's buffered chunks should be
/// transmuted into an output.
pub trait WindowPolicy<C>: Send + Sync {
    /// The minimum number of trailing entries considered "the window"
    /// when evaluating `should_emit`. A policy that looks only at the
    /// single latest entry returns `1`.
    fn min_lookback(&self) -> usize;

    fn should_emit(&self, window: &StreamWindow<C>) -> bool;
}

/// Decides how to split one transmuted output into sub-entries.
pub trait ShatterPolicy<O, C>: Send + Sync {
    fn shatter(&self, output: &O) -> Vec<C>;
}

/// Folds a buffer of chunks into one coarser output, optionally
/// carrying a remainder forward into the next buffer.
pub trait BatchTransmuter<C, O>: Send + Sync {
    fn transmute(&self, buffer: Vec<Record<C>>) -> TransmuteOutcome<O, C>;
}

/// Emits when either sub-policy would emit; looks back as far as the
/// more demanding of the two.
pub struct Or<A, B> {
    a: A,
    b: B,
}

impl<A, B> Or<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<C, A, B> WindowPolicy<C> for Or<A, B>
where
    A: WindowPolicy<C>,
    B: WindowPolicy<C>,
{
    fn min_lookback(&self) -> usize {
        self.a.min_lookback().max(self.b.min_lookback())
    }

    fn should_emit(&self, window: &StreamWindow<C>) -> bool {
        self.a.should_emit(window) || self.b.should_emit(window)
    }
}

/// Never emits from `should_emit`; relies entirely on a completion
/// marker to drain the buffer. Used when a windowing daemon's only
/// flush trigger is the explicit completion entry.
pub struct CompletionOnly;

impl<C> WindowPolicy<C> for CompletionOnly {
    fn min_lookback(&self) -> usize {
        1
    }

    fn should_emit(&self, _window: &StreamWindow<C>) -> bool {
        false
    }
}

/// Emits once the pending buffer reaches `n` entries. Also usable as a
/// `FlushPredicate` building block in `daemon::flush`.
pub struct CountThreshold(pub usize);

impl<C> WindowPolicy<C> for CountThreshold {
    fn min_lookback(&self) -> usize {
        self.0.max(1)
    }

    fn should_emit(&self, window: &StreamWindow<C>) -> bool {
        window.pending.len() >= self.0
    }
}

impl<C> CountThreshold {
    pub fn should_flush(&self, batch: &[Record<C>]) -> bool {
        batch.len() >= self.0
    }
}

/// Wraps a closure as a `WindowPolicy`, `ShatterPolicy`, or
/// `BatchTransmuter` — the "lambda form" of each contract, for callers
/// who don't need a named type.
pub struct Lambda<F>(pub F);

impl<C, F> WindowPolicy<C> for Lambda<F>
where
    F: Fn(&StreamWindow<C>) -> bool + Send + Sync,
{
    fn min_lookback(&self) -> usize {
        1
    }

    fn should_emit(&self, window: &StreamWindow<C>) -> bool {
        (self.0)(window)
    }
}

impl<O, C, F> ShatterPolicy<O, C> for Lambda<F>
where
    F: Fn(&O) -> Vec<C> + Send + Sync,
{
    fn shatter(&self, output: &O) -> Vec<C> {
        (self.0)(output)
    }
}

impl<C, O, F> BatchTransmuter<C, O> for Lambda<F>
where
    F: Fn(Vec<Record<C>>) -> TransmuteOutcome<O, C> + Send + Sync,
{
    fn transmute(&self, buffer: Vec<Record<C>>) -> TransmuteOutcome<O, C> {
        (self.0)(buffer)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
