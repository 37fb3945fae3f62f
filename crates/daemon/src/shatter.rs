// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shattering daemon: a structural simplification of the windowing
//! daemon's pump with no buffering and no window policy — for each
//! source entry it shatters, append the resulting chunks in order, then
//! append a completion marker built from the source entry.
//!
//! Shares `pump_support`'s start-position and panic-catching helpers
//! with `WindowingDaemon` so the two daemons cannot drift in their
//! Start/Shutdown/Fail semantics.

use std::sync::Arc;

use async_trait::async_trait;
use coven_core::{DaemonFailure, Scrivener};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::Pump;
use crate::policy::ShatterPolicy;
use crate::pump_support::{catch_pump_panic, tail_start_position};

/// What a `ShatteringDaemon` appends to its sink: the in-order chunks
/// produced from one source entry, followed by a completion marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShatterOutput<C, X> {
    Chunk(C),
    Completion(X),
}

pub struct ShatteringDaemon<S, C, X, P> {
    source: Arc<dyn Scrivener<S>>,
    sink: Arc<dyn Scrivener<ShatterOutput<C, X>>>,
    shatter: P,
    completion_factory: Box<dyn Fn(&S) -> X + Send + Sync>,
}

impl<S, C, X, P> ShatteringDaemon<S, C, X, P>
where
    S: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    X: Clone + Send + Sync + 'static,
    P: ShatterPolicy<S, C> + Send + Sync + 'static,
{
    pub fn new(
        source: Arc<dyn Scrivener<S>>,
        sink: Arc<dyn Scrivener<ShatterOutput<C, X>>>,
        shatter: P,
        completion_factory: impl Fn(&S) -> X + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            sink,
            shatter,
            completion_factory: Box::new(completion_factory),
        }
    }
}

#[async_trait]
impl<S, C, X, P> Pump for ShatteringDaemon<S, C, X, P>
where
    S: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    X: Clone + Send + Sync + 'static,
    P: ShatterPolicy<S, C> + Send + Sync + 'static,
{
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), DaemonFailure> {
        let mut tail = self.source.tail(tail_start_position(self.source.as_ref()));

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = tail.next() => next,
            };
            let Some(record) = next else { break };

            let chunks = catch_pump_panic(|| self.shatter.shatter(&record.entry))?;
            for chunk in chunks {
                self.sink.write(ShatterOutput::Chunk(chunk)).await?;
            }
            let completion = (self.completion_factory)(&record.entry);
            self.sink.write(ShatterOutput::Completion(completion)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "shatter_tests.rs"]
mod tests;
