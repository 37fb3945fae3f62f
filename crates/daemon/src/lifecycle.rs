// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervised daemon lifecycle: `Stopped -> Running -> Completed`,
//! with a `FailureOccurred` side-channel that must precede the final
//! `Completed`. Every daemon publishes its own transitions through the
//! same `Scrivener<DaemonEvent>` contract it serves, rather than a
//! parallel notification mechanism.
//!
//! Grounded on `lifecycle.rs`'s `Config`/startup sequencing (the
//! "acquire resource, then publish readiness" ordering) and
//! `agent_run.rs`'s linear status enum, generalized into a reusable
//! supervisor parameterized over a `Pump`.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use coven_core::{
    wait_for_map, DaemonEvent, DaemonFailure, DaemonStatus, IdGen, Scrivener, ScrivenerError,
    UuidIdGen,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use crate::error::DaemonError;

coven_core::define_id! {
    /// Identifies one `Daemon` instance for tracing/observability only —
    /// never part of the `DaemonEvent` wire shape, since the journal
    /// contract (§4.2) doesn't carry one.
    pub struct DaemonId;
}

/// The work a `Daemon` supervises. Implementations cooperate with
/// cancellation by checking `cancel` (or racing it in a `select!`) and
/// return promptly once it fires.
#[async_trait]
pub trait Pump: Send + 'static {
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), DaemonFailure>;
}

/// Supervises one `Pump` through its `Stopped -> Running -> Completed`
/// lifecycle, publishing every transition to `events`.
pub struct Daemon<P: Pump> {
    id: DaemonId,
    events: Arc<dyn Scrivener<DaemonEvent>>,
    cancel: CancellationToken,
    started: AtomicBool,
    shutdown_started: AtomicBool,
    failed: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    _pump: PhantomData<P>,
}

impl<P: Pump> Daemon<P> {
    pub fn new(events: Arc<dyn Scrivener<DaemonEvent>>) -> Self {
        Self {
            id: DaemonId::new(UuidIdGen.next()),
            events,
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            shutdown_started: AtomicBool::new(false),
            failed: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            _pump: PhantomData,
        }
    }

    /// The identifier this daemon's pump span is tagged with.
    pub fn id(&self) -> &DaemonId {
        &self.id
    }

    /// The token the pump's own internal cancellation sources (e.g. a
    /// caller-supplied deadline) should be linked to, per §5's
    /// "internal source linked with a caller-supplied one".
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn `pump` and publish `StatusChanged(Running)` before
    /// returning, so a caller awaiting `wait_for(Running)` never misses
    /// it. A second call (on an already-started daemon) is rejected
    /// rather than left undefined.
    pub async fn start(&self, pump: P) -> Result<(), DaemonError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DaemonError::AlreadyStarted);
        }

        self.events
            .write(DaemonEvent::StatusChanged {
                status: DaemonStatus::Running,
            })
            .await?;

        let mut pump = pump;
        let cancel = self.cancel.clone();
        let events = Arc::clone(&self.events);
        let failed = Arc::clone(&self.failed);
        let daemon_id = self.id.clone();

        let join = tokio::spawn(
            async move {
                match pump.run(cancel).await {
                    Ok(()) => {}
                    Err(failure) => publish_failure(&events, &failed, failure).await,
                }
            }
            .instrument(info_span!("daemon_pump", daemon_id = %daemon_id)),
        );
        *self.handle.lock() = Some(join);
        Ok(())
    }

    /// Cancel the pump and await its completion, publishing
    /// `StatusChanged(Completed)` once (idempotent across repeated
    /// calls). A pump that panics is routed through the same failure
    /// path as one that returns `Err` — tokio isolates panics at the
    /// task boundary, so this is the pump's one recovery point.
    pub async fn shutdown(&self) {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            match handle.await {
                Ok(()) => {}
                Err(join_error) if join_error.is_panic() => {
                    let message = panic_message(join_error);
                    publish_failure(&self.events, &self.failed, DaemonFailure::custom(message)).await;
                }
                Err(_) => {}
            }
        }
        if !self.failed.load(Ordering::SeqCst) {
            let _ = self
                .events
                .write(DaemonEvent::StatusChanged {
                    status: DaemonStatus::Completed,
                })
                .await;
        }
    }

    /// Publish `FailureOccurred` followed by `StatusChanged(Completed)`,
    /// exactly once. Safe to call from within a pump's own error path.
    pub async fn fail(&self, error: DaemonFailure) {
        publish_failure(&self.events, &self.failed, error).await;
    }

    /// Block until an equal-or-later status is observed on the event
    /// journal (`DaemonStatus`'s derived `Ord` following
    /// `Stopped < Running < Completed`), so a caller that asks for
    /// `Running` after the daemon has already reached `Completed` still
    /// returns instead of hanging on a transition that already happened.
    pub async fn wait_for(&self, status: DaemonStatus) -> Result<(), ScrivenerError> {
        wait_for_map(self.events.as_ref(), 0, move |event: &DaemonEvent| {
            event.status().filter(|&s| s >= status).map(|_| ())
        })
        .await
        .map(|_| ())
    }

    /// Block until a `FailureOccurred` is observed, returning its payload.
    pub async fn wait_for_failure(&self) -> Result<DaemonFailure, ScrivenerError> {
        wait_for_map(self.events.as_ref(), 0, |event: &DaemonEvent| {
            event.failure().cloned()
        })
        .await
        .map(|(_, failure)| failure)
    }
}

async fn publish_failure(
    events: &Arc<dyn Scrivener<DaemonEvent>>,
    failed: &AtomicBool,
    error: DaemonFailure,
) {
    if failed.swap(true, Ordering::SeqCst) {
        return;
    }
    let _ = events.write(DaemonEvent::FailureOccurred { error }).await;
    let _ = events
        .write(DaemonEvent::StatusChanged {
            status: DaemonStatus::Completed,
        })
        .await;
}

fn panic_message(join_error: tokio::task::JoinError) -> String {
    match join_error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "daemon pump panicked".to_string()),
        Err(_) => "daemon pump task was cancelled before completion".to_string(),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
