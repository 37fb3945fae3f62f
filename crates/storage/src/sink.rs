// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flush targets for the flusher daemon: a pluggable `EntrySerializer`
//! and `FlushSink` pair, with a default JSON-lines file implementation.
//!
//! Grounded directly on `Wal::flush`'s single-fsync-per-batch
//! discipline — a batch is durable only after one `sync_all` call, not
//! one per line.

use async_trait::async_trait;
use coven_core::{Position, Record};
use serde::Serialize;
use std::io::Write as _;
use std::marker::PhantomData;
use std::path::PathBuf;
use thiserror::Error;

/// Renders a single entry to the line written for one flushed record.
pub trait EntrySerializer<E>: Send + Sync {
    fn serialize(&self, position: Position, entry: &E) -> String;
}

/// Default serializer: one JSON object per line,
/// `{"schemaVersion": "1", "position": N, "entry": ...}`.
pub struct JsonLineSerializer;

#[derive(Serialize)]
struct Line<'a, E> {
    #[serde(rename = "schemaVersion")]
    schema_version: &'static str,
    position: u64,
    entry: &'a E,
}

impl<E> EntrySerializer<E> for JsonLineSerializer
where
    E: Serialize,
{
    fn serialize(&self, position: Position, entry: &E) -> String {
        serde_json::to_string(&Line {
            schema_version: crate::entry::SCHEMA_VERSION,
            position: position.get(),
            entry,
        })
        .unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A durable target for flushed batches. The flusher daemon calls
/// `append_snapshot` once per retired buffer; a sink must not drop a
/// batch it has returned `Ok` for.
#[async_trait]
pub trait FlushSink<E>: Send + Sync {
    async fn append_snapshot(&self, batch: &[Record<E>]) -> Result<(), SinkError>;
}

/// Appends each record as one line to a flat file, creating parent
/// directories as needed and `sync_all`-ing once per batch.
pub struct FileSink<E, S = JsonLineSerializer> {
    path: PathBuf,
    serializer: S,
    _entry: PhantomData<fn(E)>,
}

impl<E, S> FileSink<E, S> {
    pub fn new(path: impl Into<PathBuf>, serializer: S) -> Self {
        Self {
            path: path.into(),
            serializer,
            _entry: PhantomData,
        }
    }
}

impl<E> FileSink<E, JsonLineSerializer> {
    pub fn json_lines(path: impl Into<PathBuf>) -> Self {
        Self::new(path, JsonLineSerializer)
    }
}

#[async_trait]
impl<E, S> FlushSink<E> for FileSink<E, S>
where
    E: Clone + Send + Sync + 'static,
    S: EntrySerializer<E> + 'static,
{
    async fn append_snapshot(&self, batch: &[Record<E>]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let lines: Vec<String> = batch
            .iter()
            .map(|record| self.serializer.serialize(record.position, &record.entry))
            .collect();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            for line in lines {
                writeln!(file, "{line}")?;
            }
            file.sync_all()?;
            Ok(())
        })
        .await
        .map_err(|e| SinkError::Io(std::io::Error::other(e.to_string())))??;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
