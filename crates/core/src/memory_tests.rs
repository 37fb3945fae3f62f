// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn positions_are_dense_monotonic_from_one() {
    let scrivener = InMemoryScrivener::<&str>::new();
    let p1 = scrivener.write("a").await.unwrap();
    let p2 = scrivener.write("b").await.unwrap();
    let p3 = scrivener.write("c").await.unwrap();
    assert_eq!([p1.get(), p2.get(), p3.get()], [1, 2, 3]);
}

#[tokio::test]
async fn write_wakes_an_existing_tail() {
    let scrivener = InMemoryScrivener::<&str>::new();
    let mut tail = scrivener.tail(0);

    let writer = scrivener.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        writer.write("hello").await.unwrap();
    });

    let record = tail.next().await.unwrap();
    assert_eq!(record.position.get(), 1);
    assert_eq!(record.entry, "hello");
}

#[tokio::test]
async fn tail_is_contiguous_with_no_gaps() {
    let scrivener = InMemoryScrivener::<u32>::new();
    for n in 0..10 {
        scrivener.write(n).await.unwrap();
    }

    let mut tail = scrivener.tail(0);
    for expected_pos in 1..=10u64 {
        let record = tail.next().await.unwrap();
        assert_eq!(record.position.get(), expected_pos);
        assert_eq!(record.entry, (expected_pos - 1) as u32);
    }
}

#[tokio::test]
async fn tail_can_restart_from_an_anchor() {
    let scrivener = InMemoryScrivener::<u32>::new();
    for n in 0..5 {
        scrivener.write(n).await.unwrap();
    }

    let mut tail = scrivener.tail(3);
    let record = tail.next().await.unwrap();
    assert_eq!(record.position.get(), 4);
}

#[tokio::test]
async fn tail_at_max_yields_nothing() {
    let scrivener = InMemoryScrivener::<u32>::new();
    scrivener.write(1).await.unwrap();
    let mut tail = scrivener.tail(u64::MAX);
    assert!(tail.next().await.is_none());
}

#[tokio::test]
async fn read_backward_snapshots_at_call_time() {
    let scrivener = InMemoryScrivener::<u32>::new();
    for n in 0..5 {
        scrivener.write(n).await.unwrap();
    }

    let snapshot = scrivener.read_backward(4);
    let positions: Vec<u64> = snapshot.iter().map(|r| r.position.get()).collect();
    assert_eq!(positions, vec![3, 2, 1]);

    // Writes after the call are not observed by the already-taken snapshot.
    scrivener.write(99).await.unwrap();
    let positions_again: Vec<u64> = snapshot.iter().map(|r| r.position.get()).collect();
    assert_eq!(positions_again, vec![3, 2, 1]);
}

#[tokio::test]
async fn read_backward_reflects_a_fresh_call() {
    let scrivener = InMemoryScrivener::<u32>::new();
    for n in 0..3 {
        scrivener.write(n).await.unwrap();
    }
    scrivener.write(99).await.unwrap();

    let snapshot = scrivener.read_backward(u64::MAX);
    let positions: Vec<u64> = snapshot.iter().map(|r| r.position.get()).collect();
    assert_eq!(positions, vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn wait_for_yields_the_minimum_matching_position() {
    let scrivener = InMemoryScrivener::<u32>::new();
    for n in [1, 2, 3, 10, 4] {
        scrivener.write(n).await.unwrap();
    }

    let record = scrivener
        .wait_for(0, Box::new(|n: &u32| *n > 5))
        .await
        .unwrap();
    assert_eq!(record.position.get(), 4);
    assert_eq!(record.entry, 10);
}

#[tokio::test]
async fn wait_for_blocks_until_a_match_is_written() {
    let scrivener = InMemoryScrivener::<u32>::new();
    scrivener.write(1).await.unwrap();

    let waiter_scrivener = scrivener.clone();
    let handle = tokio::spawn(async move {
        waiter_scrivener
            .wait_for(0, Box::new(|n: &u32| *n == 7))
            .await
    });

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    scrivener.write(2).await.unwrap();
    scrivener.write(7).await.unwrap();

    let record = handle.await.unwrap().unwrap();
    assert_eq!(record.position.get(), 3);
}

#[tokio::test]
async fn wait_for_rejects_max_sentinel() {
    let scrivener = InMemoryScrivener::<u32>::new();
    let result = scrivener.wait_for(u64::MAX, Box::new(|_: &u32| true)).await;
    assert!(matches!(result, Err(ScrivenerError::InvalidArgument(_))));
}

#[tokio::test]
async fn concurrent_writers_produce_a_dense_permutation() {
    // S1: two writers append three entries each concurrently; a tailer
    // started at anchor 0 observes all six with positions 1..=6 in
    // strictly increasing order, with no gaps or duplicates.
    let scrivener = InMemoryScrivener::<&'static str>::new();
    let mut tail = scrivener.tail(0);

    let a = scrivener.clone();
    let b = scrivener.clone();
    let writer_a = tokio::spawn(async move {
        for entry in ["a", "b", "c"] {
            a.write(entry).await.unwrap();
        }
    });
    let writer_b = tokio::spawn(async move {
        for entry in ["d", "e", "f"] {
            b.write(entry).await.unwrap();
        }
    });

    let mut seen = HashSet::new();
    let mut last_position = 0u64;
    for _ in 0..6 {
        let record = tail.next().await.unwrap();
        assert!(record.position.get() > last_position, "tail must be strictly increasing");
        last_position = record.position.get();
        seen.insert(record.entry);
    }

    writer_a.await.unwrap();
    writer_b.await.unwrap();

    assert_eq!(seen, HashSet::from(["a", "b", "c", "d", "e", "f"]));
    assert_eq!(scrivener.len(), 6);
}

#[tokio::test]
async fn cloned_scriveners_share_the_same_journal() {
    let scrivener = InMemoryScrivener::<u32>::new();
    let clone = scrivener.clone();
    clone.write(1).await.unwrap();
    assert_eq!(scrivener.len(), 1);
}

#[tokio::test]
async fn entries_are_immutable_once_written() {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Payload(Arc<String>);

    let scrivener = InMemoryScrivener::<Payload>::new();
    let payload = Payload(Arc::new("frozen".to_string()));
    scrivener.write(payload.clone()).await.unwrap();

    let first = scrivener.read_backward(u64::MAX);
    let second = scrivener.read_backward(u64::MAX);
    assert_eq!(first, second);
    assert_eq!(first[0].entry, payload);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Invariant 1: the set of positions returned by successful
        /// writes is `{1..N}`, in the order of return.
        #[test]
        fn dense_monotonic_positions(entries in proptest::collection::vec(any::<u32>(), 0..50)) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let scrivener = InMemoryScrivener::<u32>::new();
                let mut positions = Vec::new();
                for entry in &entries {
                    positions.push(scrivener.write(*entry).await.unwrap().get());
                }
                let expected: Vec<u64> = (1..=entries.len() as u64).collect();
                prop_assert_eq!(positions, expected);
                Ok(())
            })?;
        }

        /// Invariant 3: `read_backward(b)` yields exactly the positions
        /// that existed and were `< b` at call time.
        #[test]
        fn backward_snapshot_matches_definition(n in 0u64..30, before in 0u64..35) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let scrivener = InMemoryScrivener::<u64>::new();
                for i in 0..n {
                    scrivener.write(i).await.unwrap();
                }
                let snapshot = scrivener.read_backward(before);
                let positions: Vec<u64> = snapshot.iter().map(|r| r.position.get()).collect();
                let expected: Vec<u64> = (1..=n).rev().filter(|p| *p < before).collect();
                prop_assert_eq!(positions, expected);
                Ok(())
            })?;
        }
    }
}
