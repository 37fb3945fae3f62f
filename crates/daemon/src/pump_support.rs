// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The piece of `Pump::run` shared by `WindowingDaemon` and
//! `ShatteringDaemon`: locating the tail start position and catching a
//! panic raised inside caller-supplied policy/transmuter code so it is
//! routed through `Daemon::fail` rather than unwinding the pump task.
//!
//! A bare panic inside `tokio::spawn` is already isolated per-task (see
//! `lifecycle::Daemon::shutdown`), but a windowing/shattering pump's own
//! `run` loop keeps running across many buffered entries; without this
//! guard, one bad transmuter call would unwind the whole pump instead of
//! just the iteration that triggered it, silently dropping everything
//! still in `tail`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use coven_core::{DaemonFailure, Scrivener};

/// The position a pump should start tailing from: one past whatever
/// was already on the journal when the daemon started.
pub(crate) fn tail_start_position<E>(source: &dyn Scrivener<E>) -> u64
where
    E: Clone + Send + Sync + 'static,
{
    source
        .read_backward(u64::MAX)
        .first()
        .map(|record| record.position.get())
        .unwrap_or(coven_core::position::BEFORE_FIRST)
}

/// Runs `step`, converting an unwind into a `DaemonFailure::Custom`
/// instead of propagating it. `step` must not itself hold a `!UnwindSafe`
/// borrow across an await point in a way that would leave shared state
/// inconsistent; windowing/shattering only ever call this around pure
/// policy/transmuter invocations, never around the `.await`s themselves.
pub(crate) fn catch_pump_panic<F, T>(step: F) -> Result<T, DaemonFailure>
where
    F: FnOnce() -> T,
{
    catch_unwind(AssertUnwindSafe(step)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic in policy/transmuter callback".to_string());
        DaemonFailure::custom(message)
    })
}
