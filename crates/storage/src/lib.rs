// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! coven-storage: the file-backed `Scrivener`, its on-disk record
//! envelope, and the flush-sink contracts the flusher daemon persists
//! snapshots through.

pub mod config;
pub mod entry;
pub mod error;
pub mod file_scrivener;
pub mod sink;

pub use entry::{TypeTag, SCHEMA_VERSION};
pub use error::StorageError;
pub use file_scrivener::FileScrivener;
pub use sink::{EntrySerializer, FileSink, FlushSink, JsonLineSerializer, SinkError};
