// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The flusher daemon: bounds a journal's memory footprint by
//! persisting retired batches to a `FlushSink`, through an explicit
//! producer/consumer pair connected by a bounded channel.
//!
//! Grounded on `event_bus.rs`'s single-writer/single-reader WAL handle
//! pattern, generalized from one reused `Wal::write_buffer` to an
//! actual pool of buffers — the teacher's producer and consumer share
//! one WAL under a lock; here they run on separate tasks, so the
//! "buffer currently being filled" and "buffer currently being
//! persisted" must be genuinely distinct allocations.

use std::sync::Arc;

use async_trait::async_trait;
use coven_core::{DaemonFailure, Record, Scrivener};
use coven_storage::FlushSink;
use crossbeam_queue::ArrayQueue;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::flush_queue_capacity;
use crate::lifecycle::Pump;
use crate::policy::CountThreshold;

/// A predicate deciding whether the producer's currently-filling
/// buffer should be retired and handed to the consumer.
pub struct FlushPredicate<E>(Arc<dyn Fn(&[Record<E>]) -> bool + Send + Sync>);

impl<E> FlushPredicate<E> {
    pub fn new(predicate: impl Fn(&[Record<E>]) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// A predicate that fires once the active buffer reaches `n` entries.
    pub fn count_threshold(n: usize) -> Self {
        let threshold = CountThreshold(n);
        Self::new(move |batch: &[Record<E>]| threshold.should_flush(batch))
    }

    fn check(&self, batch: &[Record<E>]) -> bool {
        (self.0)(batch)
    }
}

impl<E> Clone for FlushPredicate<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// A lock-free pool of reusable batch buffers. Sized
/// `flush_queue_capacity + 2` so a free buffer is always available
/// after the bounded channel between producer and consumer is full.
struct BufferPool<E> {
    free: ArrayQueue<Vec<Record<E>>>,
}

impl<E> BufferPool<E> {
    fn new(capacity: usize) -> Self {
        let free = ArrayQueue::new(capacity);
        for _ in 0..capacity {
            let _ = free.push(Vec::new());
        }
        Self { free }
    }

    fn take(&self) -> Vec<Record<E>> {
        self.free.pop().unwrap_or_default()
    }

    fn give_back(&self, mut batch: Vec<Record<E>>) {
        batch.clear();
        let _ = self.free.push(batch);
    }
}

/// Tails `source` and persists retired batches to `Sink` once
/// `predicate` fires.
pub struct FlusherDaemon<E, Sink> {
    source: Arc<dyn Scrivener<E>>,
    sink: Arc<Sink>,
    predicate: FlushPredicate<E>,
    pool: Arc<BufferPool<E>>,
}

impl<E, Sink> FlusherDaemon<E, Sink>
where
    E: Clone + Send + Sync + 'static,
    Sink: FlushSink<E> + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn Scrivener<E>>, sink: Arc<Sink>, predicate: FlushPredicate<E>) -> Self {
        let pool = Arc::new(BufferPool::new(flush_queue_capacity() + 2));
        Self {
            source,
            sink,
            predicate,
            pool,
        }
    }
}

#[async_trait]
impl<E, Sink> Pump for FlusherDaemon<E, Sink>
where
    E: Clone + Send + Sync + 'static,
    Sink: FlushSink<E> + Send + Sync + 'static,
{
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), DaemonFailure> {
        let capacity = flush_queue_capacity();
        let (tx, mut rx) = mpsc::channel::<Vec<Record<E>>>(capacity);

        let consumer_sink = Arc::clone(&self.sink);
        let consumer_pool = Arc::clone(&self.pool);
        let consumer = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                if let Err(error) = consumer_sink.append_snapshot(&batch).await {
                    warn!(%error, "flusher sink rejected a batch");
                }
                consumer_pool.give_back(batch);
            }
        });

        let mut active: Vec<Record<E>> = self.pool.take();
        // Unlike the windowing/shattering pumps, the flusher tails from
        // the very first record rather than `tail_start_position`'s
        // "whatever already exists at start" anchor: §8 Invariant 7
        // ("the multiset of records delivered to the sink equals the
        // multiset of records written to the source scrivener up to
        // shutdown") is unqualified, so a record written before this
        // pump starts must still reach the sink.
        let mut tail = self.source.tail(coven_core::position::BEFORE_FIRST);
        let producer_result: Result<(), DaemonFailure> = loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                next = tail.next() => next,
            };
            let Some(record) = next else { break Ok(()) };
            if cancel.is_cancelled() {
                break Ok(());
            }

            active.push(record);
            if self.predicate.check(&active) {
                let retired = std::mem::replace(&mut active, self.pool.take());
                debug_assert!(!self.predicate.check(&active), "a freshly swapped buffer must not immediately satisfy the predicate");
                if tx.send(retired).await.is_err() {
                    break Ok(());
                }
            }
        };

        if !active.is_empty() {
            let _ = tx.send(active).await;
        }
        drop(tx);
        let _ = consumer.await;

        producer_result
    }
}

#[cfg(test)]
#[path = "flush_tests.rs"]
mod tests;
