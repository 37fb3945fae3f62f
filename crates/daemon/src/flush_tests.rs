// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use coven_core::InMemoryScrivener;
use coven_storage::FileSink;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn flushes_a_batch_once_the_count_threshold_is_reached() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.jsonl");
    let source: Arc<InMemoryScrivener<u32>> = Arc::new(InMemoryScrivener::new());
    let sink = Arc::new(FileSink::json_lines(&path));
    let mut daemon = FlusherDaemon::new(
        Arc::clone(&source) as Arc<dyn Scrivener<u32>>,
        sink,
        FlushPredicate::count_threshold(3),
    );
    let cancel = CancellationToken::new();

    let cancel_for_pump = cancel.clone();
    let handle = tokio::spawn(async move { daemon.run(cancel_for_pump).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    for n in [1u32, 2, 3] {
        source.write(n).await.unwrap();
    }

    let mut waited = 0;
    while !path.exists() && waited < 50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += 1;
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 3);
}

#[tokio::test]
async fn flushes_the_remainder_on_shutdown_even_below_threshold() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.jsonl");
    let source: Arc<InMemoryScrivener<u32>> = Arc::new(InMemoryScrivener::new());
    let sink = Arc::new(FileSink::json_lines(&path));
    let mut daemon = FlusherDaemon::new(
        Arc::clone(&source) as Arc<dyn Scrivener<u32>>,
        sink,
        FlushPredicate::count_threshold(100),
    );
    let cancel = CancellationToken::new();

    let cancel_for_pump = cancel.clone();
    let handle = tokio::spawn(async move { daemon.run(cancel_for_pump).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    source.write(42).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!path.exists(), "threshold not yet met, nothing should be flushed");

    cancel.cancel();
    handle.await.unwrap().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 1);
}
