// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

const DEFAULT_FLUSH_QUEUE_CAPACITY: usize = 64;

/// Bounded-channel capacity between a flusher's producer and consumer.
/// The buffer pool is sized `flush_queue_capacity + 2` so a free buffer
/// is always available after the channel itself is full.
pub fn flush_queue_capacity() -> usize {
    std::env::var("COVEN_FLUSH_QUEUE_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_FLUSH_QUEUE_CAPACITY)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
