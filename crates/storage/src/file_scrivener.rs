// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The file-backed `Scrivener` implementation: one JSON file per record
//! under a directory, a process-wide advisory lock guarding writers,
//! and a directory watch raced against a bounded poll for tailing.
//!
//! Grounded on `wal.rs` (JSONL append + `entries_after`, generalized
//! from one file to one-file-per-record so concurrent readers never
//! observe a partially-written record), `lifecycle.rs`'s
//! `fs2::FileExt::lock_exclusive` startup-lock idiom, and
//! `watcher.rs`'s `notify`-watch-raced-against-poll `tokio::select!`
//! shape.

use crate::config;
use crate::entry::{OnDiskRecord, OnDiskRecordRef, TypeTag, SCHEMA_VERSION};
use crate::error::StorageError;
use async_trait::async_trait;
use coven_core::{Position, Predicate, Record, Scrivener, ScrivenerError, Tail, TailCursor};
use fs2::FileExt;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::warn;

/// Zero-padded filename width; generous enough that positions never
/// outgrow lexicographic == numeric ordering within one journal.
const FILENAME_WIDTH: usize = 20;

fn record_path(dir: &Path, position: u64) -> PathBuf {
    dir.join(format!("{position:0FILENAME_WIDTH$}.json"))
}

fn tmp_path(dir: &Path, position: u64) -> PathBuf {
    dir.join(format!("{position:0FILENAME_WIDTH$}.json.tmp"))
}

fn parse_position_from_filename(name: &str) -> Option<u64> {
    name.strip_suffix(".json")?.parse::<u64>().ok()
}

fn scan_highest_position(dir: &Path) -> Option<u64> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter_map(|name| parse_position_from_filename(&name))
        .max()
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) {
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) {}

struct Inner<E> {
    dir: PathBuf,
    tag: Arc<dyn TypeTag<E>>,
    /// Best-effort, this-process view of the highest assigned position.
    /// Seeded from a directory scan (and `head.txt`) at open time.
    counter: AtomicU64,
    notify: Notify,
}

fn read_one<E>(inner: &Inner<E>, position: u64) -> Option<Record<E>> {
    let path = record_path(&inner.dir, position);
    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(_) => return None,
    };
    let on_disk: OnDiskRecord = match serde_json::from_slice(&bytes) {
        Ok(r) => r,
        Err(e) => {
            warn!(position, error = %e, "malformed journal record, treating as unreadable");
            return None;
        }
    };
    let decoded = inner.tag.decode(&on_disk.type_tag, on_disk.payload);
    let Some(entry) = decoded else {
        warn!(position, type_tag = %on_disk.type_tag, "unrecognized type tag, treating as unreadable");
        return None;
    };
    let pos = Position::new(on_disk.pos)?;
    Some(Record::new(pos, entry))
}

fn write_record_blocking<E>(
    dir: &Path,
    tag_str: String,
    payload: serde_json::Value,
    counter: &AtomicU64,
) -> Result<u64, StorageError> {
    fs::create_dir_all(dir)?;
    let lock_path = dir.join("journal.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)?;
    lock_file
        .lock_exclusive()
        .map_err(|_| StorageError::LockContention(lock_path.clone()))?;

    let scanned = scan_highest_position(dir).unwrap_or(0);
    let mut candidate = scanned.max(counter.load(Ordering::SeqCst)) + 1;

    loop {
        let tmp = tmp_path(dir, candidate);
        let final_path = record_path(dir, candidate);
        let envelope = OnDiskRecordRef {
            schema_version: SCHEMA_VERSION,
            pos: candidate,
            type_tag: tag_str.clone(),
            payload: payload.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        // Hard-link rather than rename so a colliding position (another
        // process raced us between the scan and this write) is detected
        // as `AlreadyExists` instead of silently overwriting — `rename`
        // on POSIX replaces its destination without error.
        match fs::hard_link(&tmp, &final_path) {
            Ok(()) => {
                let _ = fs::remove_file(&tmp);
                break;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                candidate += 1;
                continue;
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                FileExt::unlock(&lock_file).ok();
                return Err(e.into());
            }
        }
    }

    counter.store(candidate, Ordering::SeqCst);

    // head.txt is purely an optimization for cold-start counter seeding;
    // failure here is logged, never propagated.
    if let Err(e) = fs::write(dir.join("head.txt"), candidate.to_string()) {
        warn!(error = %e, "failed to persist head.txt (best-effort)");
    }

    fsync_dir(dir);
    FileExt::unlock(&lock_file).ok();

    Ok(candidate)
}

fn create_dir_watcher(dir: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if res.is_ok() {
            let _ = tx.blocking_send(());
        }
    })
    .ok()?;
    watcher.watch(dir, RecursiveMode::NonRecursive).ok()?;
    Some(watcher)
}

/// A `Scrivener<E>` backed by one JSON file per record under a
/// directory, durable across process restarts.
///
/// Cloning is cheap and shares the same underlying directory handle.
pub struct FileScrivener<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for FileScrivener<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> FileScrivener<E>
where
    E: Send + Sync + 'static,
{
    /// Open (creating if necessary) a file-backed journal at `dir`,
    /// using `tag` to map entries to and from their on-disk type tag.
    pub fn open(dir: impl Into<PathBuf>, tag: impl TypeTag<E> + 'static) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let seeded = read_head_file(&dir)
            .into_iter()
            .chain(scan_highest_position(&dir))
            .max()
            .unwrap_or(0);
        Ok(Self {
            inner: Arc::new(Inner {
                dir,
                tag: Arc::new(tag),
                counter: AtomicU64::new(seeded),
                notify: Notify::new(),
            }),
        })
    }

    /// The directory backing this journal.
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }
}

fn read_head_file(dir: &Path) -> Option<u64> {
    fs::read_to_string(dir.join("head.txt"))
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

#[async_trait]
impl<E> Scrivener<E> for FileScrivener<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn write(&self, entry: E) -> Result<Position, ScrivenerError> {
        let inner = Arc::clone(&self.inner);
        let tag_str = inner.tag.tag(&entry);
        let payload = inner.tag.encode(&entry);
        let position = tokio::task::spawn_blocking(move || {
            write_record_blocking(&inner.dir, tag_str, payload, &inner.counter)
        })
        .await
        .map_err(|_| ScrivenerError::Cancelled)?
        .map_err(ScrivenerError::from)?;
        let position = Position::new(position)
            .ok_or_else(|| ScrivenerError::InvalidArgument("assigned position was zero".to_string()))?;
        self.inner.notify.notify_waiters();
        Ok(position)
    }

    fn tail(&self, after: u64) -> Tail<E> {
        let (tx, rx) = mpsc::channel(32);
        let watcher = create_dir_watcher(&self.inner.dir, tx);
        let cursor = FileTailCursor {
            inner: Arc::clone(&self.inner),
            cursor: after,
            exhausted: after == u64::MAX,
            watch_rx: rx,
            _watcher: watcher,
        };
        Tail::new(Box::new(cursor))
    }

    fn read_backward(&self, before: u64) -> Vec<Record<E>> {
        let dir = &self.inner.dir;
        let mut positions: Vec<u64> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter_map(|name| parse_position_from_filename(&name))
                .filter(|p| *p < before)
                .collect(),
            Err(_) => Vec::new(),
        };
        positions.sort_unstable_by(|a, b| b.cmp(a));

        positions
            .into_iter()
            .filter_map(|pos| read_one(&self.inner, pos))
            .collect()
    }

    async fn wait_for(
        &self,
        after: u64,
        predicate: Predicate<E>,
    ) -> Result<Record<E>, ScrivenerError> {
        if after == u64::MAX {
            return Err(ScrivenerError::InvalidArgument(
                "after_position must not be u64::MAX".to_string(),
            ));
        }
        let mut tail = self.tail(after);
        loop {
            match tail.next().await {
                Some(record) if predicate(&record.entry) => return Ok(record),
                Some(_) => continue,
                None => return Err(ScrivenerError::Cancelled),
            }
        }
    }

    fn len(&self) -> u64 {
        scan_highest_position(&self.inner.dir).unwrap_or(0)
    }
}

struct FileTailCursor<E> {
    inner: Arc<Inner<E>>,
    cursor: u64,
    exhausted: bool,
    watch_rx: mpsc::Receiver<()>,
    _watcher: Option<RecommendedWatcher>,
}

#[async_trait]
impl<E> TailCursor<E> for FileTailCursor<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn next(&mut self) -> Option<Record<E>> {
        if self.exhausted {
            return None;
        }
        loop {
            let candidate = self.cursor + 1;
            if let Some(record) = read_one(&self.inner, candidate) {
                self.cursor = candidate;
                return Some(record);
            }
            tokio::select! {
                _ = self.watch_rx.recv() => {}
                _ = tokio::time::sleep(config::scrivener_poll_interval()) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "file_scrivener_tests.rs"]
mod tests;
