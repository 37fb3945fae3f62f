// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk record envelope and the type-tag contract that maps an
//! entry type `E` to and from its closed set of string discriminators.
//!
//! Grounded on `wal.rs`'s `WalRecordRef`/`WalRecord` serialization pair
//! (write with a borrowing helper, read with an owning one), generalized
//! from a single fixed `Event` type to an arbitrary `E` described by a
//! caller-supplied `TypeTag<E>`.

use serde::{Deserialize, Serialize};

/// Current on-disk schema version. Bump this, not the file layout,
/// if the envelope shape ever changes.
pub const SCHEMA_VERSION: &str = "1";

/// Maps an entry type `E` to and from the closed tagged union described
/// in the on-disk envelope (`{"type": "...", "payload": {...}}`).
///
/// A `FileScrivener<E>` is constructed with one of these; unknown tags
/// or payloads that fail to deserialize against the named tag are
/// treated as unreadable records rather than panicking (see
/// `FileScrivener::read_backward`).
pub trait TypeTag<E>: Send + Sync {
    /// The discriminator for this entry, e.g. `"coven.chat.UserMessage"`.
    fn tag(&self, entry: &E) -> String;

    /// Reconstruct `E` from a previously-produced tag and payload.
    /// Returns `None` for an unrecognized tag or malformed payload.
    fn decode(&self, tag: &str, payload: serde_json::Value) -> Option<E>;

    /// Serialize `entry` to its JSON payload (the part that, together
    /// with `tag`, makes the envelope's `payload` field).
    fn encode(&self, entry: &E) -> serde_json::Value;
}

/// The envelope written to `<dir>/<position>.json`.
#[derive(Debug, Serialize)]
pub(crate) struct OnDiskRecordRef<'a> {
    #[serde(rename = "schemaVersion")]
    pub schema_version: &'a str,
    pub pos: u64,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OnDiskRecord {
    #[allow(dead_code)]
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    pub pos: u64,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub payload: serde_json::Value,
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
