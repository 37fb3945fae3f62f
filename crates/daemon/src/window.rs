// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The windowing daemon: tails a journal of fine-grained chunks,
//! batches them under a `WindowPolicy`, and transmutes each batch into
//! a coarser output — draining on an explicit completion marker.
//!
//! Grounded on `crates/adapters/src/agent/log_entry.rs::parse_entries_from`
//! (buffer partial content, emit only complete units) and
//! `crates/storage/src/wal.rs`'s group-commit buffering for the
//! "buffer until a policy fires" shape.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use coven_core::{Clock, DaemonFailure, Position, Record, Scrivener, SystemClock};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::lifecycle::Pump;
use crate::policy::{BatchTransmuter, ShatterPolicy, StreamWindow, WindowPolicy};
use crate::pump_support::{catch_pump_panic, tail_start_position};

/// What a `WindowingDaemon` appends to its sink: either one whole
/// transmuted output, or one shard of it when a `ShatterPolicy` is
/// configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowOutput<O, C> {
    Whole(O),
    Shard(C),
}

/// `E` is the source journal's entry type; `as_chunk`/`as_completion`
/// extract the two variants this pump cares about, mirroring the "match
/// the declared subtype, ignore everything else" shape used throughout
/// `wait_for_map`.
pub struct WindowingDaemon<E, C, O, X, T, W, S>
where
    E: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    source: Arc<dyn Scrivener<E>>,
    sink: Arc<dyn Scrivener<WindowOutput<O, C>>>,
    as_chunk: Box<dyn Fn(&E) -> Option<C> + Send + Sync>,
    as_completion: Box<dyn Fn(&E) -> Option<X> + Send + Sync>,
    transmuter: T,
    window_policy: W,
    shatter_policy: Option<S>,
    /// Time source behind `StreamWindow::window_start`/`last_emit`, so
    /// time-based window policies can be driven deterministically in
    /// tests via `with_clock` instead of sleeping on the wall clock.
    now: Arc<dyn Fn() -> Instant + Send + Sync>,
}

impl<E, C, O, X, T, W, S> WindowingDaemon<E, C, O, X, T, W, S>
where
    E: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
    X: Send + Sync + 'static,
    T: BatchTransmuter<C, O> + Send + Sync + 'static,
    W: WindowPolicy<C> + Send + Sync + 'static,
    S: ShatterPolicy<O, C> + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn Scrivener<E>>,
        sink: Arc<dyn Scrivener<WindowOutput<O, C>>>,
        as_chunk: impl Fn(&E) -> Option<C> + Send + Sync + 'static,
        as_completion: impl Fn(&E) -> Option<X> + Send + Sync + 'static,
        transmuter: T,
        window_policy: W,
        shatter_policy: Option<S>,
    ) -> Self {
        Self {
            source,
            sink,
            as_chunk: Box::new(as_chunk),
            as_completion: Box::new(as_completion),
            transmuter,
            window_policy,
            shatter_policy,
            now: Arc::new(|| SystemClock.now()),
        }
    }

    /// Override the time source driving `StreamWindow::window_start`/
    /// `last_emit`. Defaults to the real wall clock; tests pass a
    /// `FakeClock` to exercise time-based window policies without
    /// sleeping.
    pub fn with_clock<Clk: Clock>(mut self, clock: Clk) -> Self {
        self.now = Arc::new(move || clock.now());
        self
    }

    async fn emit(
        &self,
        buffer: &mut Vec<Record<C>>,
        last_position: Position,
    ) -> Result<(), DaemonFailure> {
        let taken = std::mem::take(buffer);
        let outcome = catch_pump_panic(|| self.transmuter.transmute(taken))?;

        if let Some(shatter) = &self.shatter_policy {
            let shards = catch_pump_panic(|| shatter.shatter(&outcome.output))?;
            for shard in shards {
                self.sink.write(WindowOutput::Shard(shard)).await?;
            }
        } else {
            self.sink.write(WindowOutput::Whole(outcome.output)).await?;
        }

        if let Some(remainder) = outcome.remainder {
            buffer.push(Record::new(last_position, remainder));
        }
        Ok(())
    }
}

#[async_trait]
impl<E, C, O, X, T, W, S> Pump for WindowingDaemon<E, C, O, X, T, W, S>
where
    E: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
    X: Send + Sync + 'static,
    T: BatchTransmuter<C, O> + Send + Sync + 'static,
    W: WindowPolicy<C> + Send + Sync + 'static,
    S: ShatterPolicy<O, C> + Send + Sync + 'static,
{
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), DaemonFailure> {
        let mut tail = self.source.tail(tail_start_position(self.source.as_ref()));
        let mut buffer: Vec<Record<C>> = Vec::new();
        let window_start = (self.now)();
        let mut last_emit = window_start;
        let mut last_position = Position::FIRST;

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = tail.next() => next,
            };
            let Some(record) = next else { break };

            if let Some(chunk) = (self.as_chunk)(&record.entry) {
                last_position = record.position;
                buffer.push(Record::new(record.position, chunk));

                let lookback = self.window_policy.min_lookback().max(1);
                let start = buffer.len().saturating_sub(lookback);
                let window = StreamWindow {
                    pending: buffer[start..].to_vec(),
                    total_observed: buffer.len() as u64,
                    window_start,
                    last_emit,
                };
                if self.window_policy.should_emit(&window) {
                    self.emit(&mut buffer, last_position).await?;
                    last_emit = (self.now)();
                }
            } else if (self.as_completion)(&record.entry).is_some() {
                loop {
                    if buffer.is_empty() {
                        break;
                    }
                    let before_len = buffer.len();
                    self.emit(&mut buffer, last_position).await?;
                    if buffer.len() == before_len {
                        warn!("windowing transmuter did not shrink the buffer on completion drain; stopping drain");
                        break;
                    }
                }
                last_emit = (self.now)();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
