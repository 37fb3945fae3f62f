// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Scrivener` contract: append, tail, backward-read, and typed
//! wait over a single logical stream of entries of type `E`.
//!
//! Both the in-memory variant (`InMemoryScrivener`, this crate) and
//! the file-backed variant (`coven_storage::FileScrivener`) implement
//! this trait identically from the caller's point of view; the
//! windowing, shattering, and flusher daemons in `coven-daemon` are
//! written entirely against `Scrivener<E>` and never know which
//! backing they are talking to.

use crate::error::ScrivenerError;
use crate::position::Position;
use crate::record::Record;
use async_trait::async_trait;

/// A predicate used by `Scrivener::wait_for`. Boxed (rather than
/// generic) so the trait stays object-safe — daemons hold scriveners
/// as `Arc<dyn Scrivener<E>>`.
pub type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

#[async_trait]
pub trait Scrivener<E>: Send + Sync
where
    E: Clone + Send + Sync + 'static,
{
    /// Append `entry`, returning its assigned, dense, monotonic
    /// position. Wakes all current tailers and waiters.
    async fn write(&self, entry: E) -> Result<Position, ScrivenerError>;

    /// A lazy, restartable cursor yielding `(position, entry)` pairs
    /// strictly ordered by position, starting at `after + 1`.
    /// `after == u64::MAX` yields an immediately-exhausted cursor.
    fn tail(&self, after: u64) -> Tail<E>;

    /// Snapshot the journal at call time; yield records with position
    /// `< before` in strictly decreasing order. Records appended after
    /// this call are never observed.
    fn read_backward(&self, before: u64) -> Vec<Record<E>>;

    /// Return the first entry strictly after `after` for which
    /// `predicate` holds, advancing silently through non-matching
    /// entries. Fails with `InvalidArgument` if `after == u64::MAX`.
    async fn wait_for(
        &self,
        after: u64,
        predicate: Predicate<E>,
    ) -> Result<Record<E>, ScrivenerError>;

    /// The highest position written so far (`0` if empty).
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The first entry strictly after `after` whose `extract` returns
/// `Some`, together with the extracted value. The convenience
/// specialization of `wait_for` for "entry is of declared subtype T":
/// callers pass an extractor that matches the variant they care about.
pub async fn wait_for_map<S, E, T, F>(
    scrivener: &S,
    after: u64,
    extract: F,
) -> Result<(Position, T), ScrivenerError>
where
    S: Scrivener<E> + ?Sized,
    E: Clone + Send + Sync + 'static,
    T: Send,
    F: Fn(&E) -> Option<T> + Send + Sync + 'static,
{
    let extract_for_predicate = {
        let extract = &extract;
        move |e: &E| extract(e).is_some()
    };
    let record = scrivener
        .wait_for(after, Box::new(extract_for_predicate))
        .await?;
    let value = extract(&record.entry).unwrap_or_else(|| {
        unreachable!("wait_for guarantees the predicate held for the returned entry")
    });
    Ok((record.position, value))
}

/// The cursor driving `Scrivener::tail`. Each backing implements its
/// own `TailCursor<E>` and wraps it here, so `Tail<E>` is a single
/// concrete type regardless of which crate produced it.
#[async_trait]
pub trait TailCursor<E>: Send
where
    E: Clone + Send + Sync + 'static,
{
    async fn next(&mut self) -> Option<Record<E>>;
}

pub struct Tail<E> {
    cursor: Box<dyn TailCursor<E> + Send>,
}

impl<E> Tail<E>
where
    E: Clone + Send + Sync + 'static,
{
    pub fn new(cursor: Box<dyn TailCursor<E> + Send>) -> Self {
        Self { cursor }
    }

    /// Await the next `(position, entry)` pair, or `None` if the
    /// cursor was cancelled.
    pub async fn next(&mut self) -> Option<Record<E>> {
        self.cursor.next().await
    }
}

#[cfg(test)]
#[path = "scrivener_tests.rs"]
mod tests;
