// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn defaults_to_64() {
    std::env::remove_var("COVEN_FLUSH_QUEUE_CAPACITY");
    assert_eq!(flush_queue_capacity(), 64);
}

#[test]
#[serial]
fn honors_override() {
    std::env::set_var("COVEN_FLUSH_QUEUE_CAPACITY", "8");
    assert_eq!(flush_queue_capacity(), 8);
    std::env::remove_var("COVEN_FLUSH_QUEUE_CAPACITY");
}

#[test]
#[serial]
fn ignores_unparseable_override() {
    std::env::set_var("COVEN_FLUSH_QUEUE_CAPACITY", "lots");
    assert_eq!(flush_queue_capacity(), 64);
    std::env::remove_var("COVEN_FLUSH_QUEUE_CAPACITY");
}
