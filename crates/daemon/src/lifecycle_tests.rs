// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use coven_core::InMemoryScrivener;
use std::time::Duration;
use tokio::time::timeout;

struct Immediate;

#[async_trait]
impl Pump for Immediate {
    async fn run(&mut self, _cancel: CancellationToken) -> Result<(), DaemonFailure> {
        Ok(())
    }
}

struct RunsUntilCancelled;

#[async_trait]
impl Pump for RunsUntilCancelled {
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), DaemonFailure> {
        cancel.cancelled().await;
        Ok(())
    }
}

struct FailsImmediately;

#[async_trait]
impl Pump for FailsImmediately {
    async fn run(&mut self, _cancel: CancellationToken) -> Result<(), DaemonFailure> {
        Err(DaemonFailure::custom("pump gave up"))
    }
}

struct Panics;

#[async_trait]
impl Pump for Panics {
    async fn run(&mut self, _cancel: CancellationToken) -> Result<(), DaemonFailure> {
        panic!("pump exploded");
    }
}

fn new_events() -> Arc<InMemoryScrivener<DaemonEvent>> {
    Arc::new(InMemoryScrivener::new())
}

#[tokio::test]
async fn start_publishes_running_before_returning() {
    let events = new_events();
    let daemon: Daemon<Immediate> = Daemon::new(events.clone());
    daemon.start(Immediate).await.unwrap();

    let records = events.read_backward(u64::MAX);
    assert!(records
        .iter()
        .any(|r| r.entry == DaemonEvent::StatusChanged {
            status: DaemonStatus::Running
        }));
}

#[tokio::test]
async fn double_start_is_rejected() {
    let events = new_events();
    let daemon: Daemon<RunsUntilCancelled> = Daemon::new(events);
    daemon.start(RunsUntilCancelled).await.unwrap();
    let err = daemon.start(RunsUntilCancelled).await.unwrap_err();
    assert!(matches!(err, DaemonError::AlreadyStarted));
    daemon.shutdown().await;
}

#[tokio::test]
async fn shutdown_cancels_the_pump_and_publishes_completed() {
    let events = new_events();
    let daemon: Daemon<RunsUntilCancelled> = Daemon::new(events.clone());
    daemon.start(RunsUntilCancelled).await.unwrap();
    daemon.shutdown().await;

    let records = events.read_backward(u64::MAX);
    assert!(records
        .iter()
        .any(|r| r.entry == DaemonEvent::StatusChanged {
            status: DaemonStatus::Completed
        }));
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let events = new_events();
    let daemon: Daemon<RunsUntilCancelled> = Daemon::new(events.clone());
    daemon.start(RunsUntilCancelled).await.unwrap();
    daemon.shutdown().await;
    daemon.shutdown().await;

    let completed_count = events
        .read_backward(u64::MAX)
        .into_iter()
        .filter(|r| {
            r.entry
                == DaemonEvent::StatusChanged {
                    status: DaemonStatus::Completed,
                }
        })
        .count();
    assert_eq!(completed_count, 1);
}

#[tokio::test]
async fn a_pump_returning_err_publishes_failure_then_completed() {
    let events = new_events();
    let daemon: Daemon<FailsImmediately> = Daemon::new(events.clone());
    daemon.start(FailsImmediately).await.unwrap();

    let failure = timeout(Duration::from_secs(1), daemon.wait_for_failure())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failure, DaemonFailure::custom("pump gave up"));

    timeout(Duration::from_secs(1), daemon.wait_for(DaemonStatus::Completed))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn a_panicking_pump_is_routed_through_fail_instead_of_crashing() {
    let events = new_events();
    let daemon: Daemon<Panics> = Daemon::new(events.clone());
    daemon.start(Panics).await.unwrap();
    daemon.shutdown().await;

    let records = events.read_backward(u64::MAX);
    assert!(records.iter().any(|r| matches!(
        &r.entry,
        DaemonEvent::FailureOccurred { error } if error.to_string().contains("pump exploded")
    )));
    assert!(records
        .iter()
        .any(|r| r.entry == DaemonEvent::StatusChanged {
            status: DaemonStatus::Completed
        }));
}

#[tokio::test]
async fn fail_called_directly_from_a_pump_is_only_published_once() {
    struct SelfReporting {
        daemon: std::sync::Weak<Daemon<SelfReporting>>,
    }

    #[async_trait]
    impl Pump for SelfReporting {
        async fn run(&mut self, _cancel: CancellationToken) -> Result<(), DaemonFailure> {
            if let Some(daemon) = self.daemon.upgrade() {
                daemon.fail(DaemonFailure::custom("reported early")).await;
            }
            Err(DaemonFailure::custom("reported late"))
        }
    }

    let events = new_events();
    let daemon: Arc<Daemon<SelfReporting>> = Arc::new(Daemon::new(events.clone()));
    let pump = SelfReporting {
        daemon: Arc::downgrade(&daemon),
    };
    daemon.start(pump).await.unwrap();
    daemon.shutdown().await;

    let failure_count = events
        .read_backward(u64::MAX)
        .into_iter()
        .filter(|r| matches!(r.entry, DaemonEvent::FailureOccurred { .. }))
        .count();
    assert_eq!(failure_count, 1);
}
