// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical, in-memory `Scrivener` implementation.
//!
//! Grounded on `oj-daemon`'s `EventBus`/`EventReader` pair (a single
//! `Mutex`-guarded buffer plus a wake channel), generalized from one
//! WAL-backed event stream to an arbitrary, type-parametric, purely
//! in-memory journal. The wakeup discipline described in the design
//! notes ("a rotatable completion primitive") is implemented with
//! `tokio::sync::Notify`, which already rotates itself on every
//! `notify_waiters` call; the bounded 250ms poll alongside it is the
//! documented backstop against a notification arriving between a
//! waiter's condition check and its registration.

use crate::error::ScrivenerError;
use crate::position::Position;
use crate::record::Record;
use crate::scrivener::{Predicate, Scrivener, Tail, TailCursor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Upper bound on how long a tailer or waiter can go without rechecking
/// its condition, even if a notification is missed. See §5 of the
/// design spec: "polls are bounded (≤ 250 ms) so wake-ups are never
/// starved by missed filesystem events" — the in-memory variant has no
/// filesystem to miss events from, but shares the same bound so its
/// observable liveness properties match the file-backed variant.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

struct Inner<E> {
    records: Mutex<Vec<Record<E>>>,
    notify: Notify,
}

/// An append-only, in-memory journal of entries of type `E`.
///
/// Cloning an `InMemoryScrivener` is cheap and shares the same
/// underlying buffer (it holds an `Arc` internally) — this is the
/// idiomatic way to hand the same scrivener to multiple daemons.
pub struct InMemoryScrivener<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for InMemoryScrivener<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for InMemoryScrivener<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryScrivener<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(Vec::new()),
                notify: Notify::new(),
            }),
        }
    }
}

#[async_trait]
impl<E> Scrivener<E> for InMemoryScrivener<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn write(&self, entry: E) -> Result<Position, ScrivenerError> {
        let position = {
            let mut records = self.inner.records.lock();
            let next = records.len() as u64 + 1;
            // `next` is `records.len() + 1`, never zero.
            let position = Position::new(next).unwrap_or(Position::FIRST);
            records.push(Record::new(position, entry));
            position
        };
        // Writes commit to the buffer before the gate completes, so a
        // tailer that wakes always observes the record it was woken for.
        self.inner.notify.notify_waiters();
        Ok(position)
    }

    fn tail(&self, after: u64) -> Tail<E> {
        let cursor = MemoryTailCursor {
            inner: Arc::clone(&self.inner),
            cursor: after,
            exhausted: after == u64::MAX,
        };
        Tail::new(Box::new(cursor))
    }

    fn read_backward(&self, before: u64) -> Vec<Record<E>> {
        let records = self.inner.records.lock();
        records
            .iter()
            .filter(|record| record.position.get() < before)
            .rev()
            .cloned()
            .collect()
    }

    async fn wait_for(
        &self,
        after: u64,
        predicate: Predicate<E>,
    ) -> Result<Record<E>, ScrivenerError> {
        if after == u64::MAX {
            return Err(ScrivenerError::InvalidArgument(
                "after_position must not be u64::MAX".to_string(),
            ));
        }
        let mut cursor = after;
        loop {
            let notified = self.inner.notify.notified();
            {
                let records = self.inner.records.lock();
                while let Some(record) = records.get(cursor as usize) {
                    if predicate(&record.entry) {
                        return Ok(record.clone());
                    }
                    cursor += 1;
                }
            }
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }

    fn len(&self) -> u64 {
        self.inner.records.lock().len() as u64
    }
}

struct MemoryTailCursor<E> {
    inner: Arc<Inner<E>>,
    /// The last position already yielded (or the starting anchor).
    cursor: u64,
    exhausted: bool,
}

#[async_trait]
impl<E> TailCursor<E> for MemoryTailCursor<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn next(&mut self) -> Option<Record<E>> {
        if self.exhausted {
            return None;
        }
        loop {
            let notified = self.inner.notify.notified();
            {
                // Position `cursor + 1` lives at index `cursor` (positions are
                // 1-based; index 0 holds position 1).
                let records = self.inner.records.lock();
                if let Some(record) = records.get(self.cursor as usize) {
                    self.cursor += 1;
                    return Some(record.clone());
                }
            }
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
