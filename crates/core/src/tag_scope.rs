// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ambient, per-ritual tag scope consulted by the router.
//!
//! Tags are case-insensitive strings organized into epochs: tags added
//! during step `k` become visible to selection only at step `k+1`.
//! This crate deliberately keeps the scope a plain, owned struct
//! (per the re-architecture guidance in the design notes) rather than
//! a thread-local/ambient global — callers thread it explicitly
//! through ritual execution.

use std::collections::HashSet;

/// An explicit override parsed from a reserved `to:*` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override {
    ByIndex(usize),
    ByType(String),
}

fn normalize(tag: &str) -> String {
    tag.trim().to_ascii_lowercase()
}

/// Per-ritual ambient tag state, organized into epochs.
#[derive(Debug, Clone, Default)]
pub struct TagScope {
    /// Tags visible to the step currently being selected.
    visible: HashSet<String>,
    /// Tags added during the step in progress; become `visible` at the
    /// next `advance_epoch`.
    pending: HashSet<String>,
}

impl TagScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the scope with tags visible to the very first selection
    /// (e.g. tags supplied by the ritual's caller).
    pub fn with_initial_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scope = Self::new();
        for tag in tags {
            scope.visible.insert(normalize(tag.as_ref()));
        }
        scope
    }

    /// Add a tag, visible starting at the next epoch.
    pub fn add(&mut self, tag: impl AsRef<str>) {
        self.pending.insert(normalize(tag.as_ref()));
    }

    /// Append `by:<TypeName>`, the router's own observability tag.
    /// Per the design notes, this is never consulted by selection
    /// scoring — it exists purely so a ritual's tag history can be
    /// inspected after the fact.
    pub fn record_executed(&mut self, type_name: &str) {
        self.add(format!("by:{type_name}"));
    }

    /// Promote pending tags to visible, starting a new epoch. Tags
    /// already visible remain so — an epoch only adds, it never clears
    /// what an earlier step (or the ritual's caller) made visible.
    /// Returns the set of newly visible tags (useful for logging).
    pub fn advance_epoch(&mut self) -> HashSet<String> {
        let promoted = std::mem::take(&mut self.pending);
        self.visible.extend(promoted.iter().cloned());
        promoted
    }

    /// Tags visible to the current selection step.
    pub fn visible_tags(&self) -> &HashSet<String> {
        &self.visible
    }

    /// Count of case-insensitive overlap between the currently visible
    /// tags and a block's capability tags.
    pub fn overlap_count<I, S>(&self, capabilities: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        capabilities
            .into_iter()
            .filter(|cap| self.visible.contains(&normalize(cap.as_ref())))
            .count()
    }

    /// Parse any `to:*` overrides present in the currently visible tags.
    /// Multiple overrides may be present; all are returned, in the
    /// (arbitrary) set-iteration order — callers try each in turn.
    pub fn overrides(&self) -> Vec<Override> {
        self.visible
            .iter()
            .filter_map(|tag| parse_override(tag))
            .collect()
    }
}

fn parse_override(tag: &str) -> Option<Override> {
    let rest = tag.strip_prefix("to:")?;
    if let Some(index) = rest.strip_prefix('#') {
        index.parse::<usize>().ok().map(Override::ByIndex)
    } else {
        Some(Override::ByType(rest.to_string()))
    }
}

#[cfg(test)]
#[path = "tag_scope_tests.rs"]
mod tests;
