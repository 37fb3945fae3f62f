// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Greeting(String),
    Marker,
}

struct EntryTag;

impl TypeTag<Entry> for EntryTag {
    fn tag(&self, entry: &Entry) -> String {
        match entry {
            Entry::Greeting(_) => "test.Greeting".to_string(),
            Entry::Marker => "test.Marker".to_string(),
        }
    }

    fn decode(&self, tag: &str, payload: serde_json::Value) -> Option<Entry> {
        match tag {
            "test.Greeting" => payload
                .get("text")
                .and_then(|v| v.as_str())
                .map(|s| Entry::Greeting(s.to_string())),
            "test.Marker" => Some(Entry::Marker),
            _ => None,
        }
    }

    fn encode(&self, entry: &Entry) -> serde_json::Value {
        match entry {
            Entry::Greeting(text) => serde_json::json!({ "text": text }),
            Entry::Marker => serde_json::json!({}),
        }
    }
}

#[test]
fn round_trips_through_tag_and_payload() {
    let tag = EntryTag;
    let entry = Entry::Greeting("hi".to_string());
    let encoded_tag = tag.tag(&entry);
    let payload = tag.encode(&entry);
    let decoded = tag.decode(&encoded_tag, payload).unwrap();
    assert_eq!(decoded, entry);
}

#[test]
fn unknown_tag_decodes_to_none() {
    let tag = EntryTag;
    assert!(tag.decode("nonexistent.Tag", serde_json::json!({})).is_none());
}

#[test]
fn malformed_payload_decodes_to_none() {
    let tag = EntryTag;
    assert!(tag.decode("test.Greeting", serde_json::json!({})).is_none());
}

#[test]
fn on_disk_record_ref_serializes_to_the_documented_shape() {
    let envelope = OnDiskRecordRef {
        schema_version: SCHEMA_VERSION,
        pos: 1,
        type_tag: "test.Greeting".to_string(),
        payload: serde_json::json!({ "text": "hi" }),
    };
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["schemaVersion"], "1");
    assert_eq!(json["pos"], 1);
    assert_eq!(json["type"], "test.Greeting");
    assert_eq!(json["payload"]["text"], "hi");
}
