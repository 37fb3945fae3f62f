// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Ritual`: one end-to-end execution of the router over a borrowed,
//! immutable `BlockRegistry`.
//!
//! Grounded on `crates/runbook/src/find.rs`'s by-name/by-trigger lookup
//! pattern, generalized into the capability-overlap scoring used for
//! step selection.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use coven_core::tag_scope::Override;
use coven_core::TagScope;
use tracing::debug;

use crate::error::RoutingError;
use crate::invoker::{AnyBlock, BlockInvoker};
use crate::registry::{BlockEntry, BlockRegistry};

/// Resolved block instances, cached per ritual so a stateful block
/// registered once is reused rather than re-resolved at every step that
/// selects it. Keyed by registry index per the selection contract.
#[derive(Default)]
struct InstanceCache {
    resolved: HashMap<usize, Arc<dyn AnyBlock>>,
}

impl InstanceCache {
    fn get_or_insert(&mut self, index: usize, block: &Arc<dyn AnyBlock>) -> Arc<dyn AnyBlock> {
        Arc::clone(
            self.resolved
                .entry(index)
                .or_insert_with(|| Arc::clone(block)),
        )
    }
}

/// The outcome of one `Ritual::step` call.
pub enum StepOutcome {
    /// A block ran; pass `value` to the next `step` call.
    Continue {
        index: usize,
        type_name: &'static str,
        value: Box<dyn Any + Send>,
    },
    /// No further block applies and the value satisfies the ritual's
    /// declared target type.
    Done(Box<dyn Any + Send>),
}

/// One end-to-end execution of the router, starting from an input value
/// and targeting a declared output type.
pub struct Ritual<'r> {
    registry: &'r BlockRegistry,
    tags: TagScope,
    fence: Option<HashSet<usize>>,
    last_index: Option<usize>,
    target_type: TypeId,
    instance_cache: InstanceCache,
}

impl<'r> Ritual<'r> {
    pub fn new<Target: 'static>(registry: &'r BlockRegistry, tags: TagScope) -> Self {
        Self {
            registry,
            tags,
            fence: None,
            last_index: None,
            target_type: TypeId::of::<Target>(),
            instance_cache: InstanceCache::default(),
        }
    }

    /// Restrict every subsequent step's candidates to `fence`.
    pub fn with_fence(mut self, fence: HashSet<usize>) -> Self {
        self.fence = Some(fence);
        self
    }

    pub fn tags(&self) -> &TagScope {
        &self.tags
    }

    /// Run the full ritual from `value` to completion.
    pub async fn run<T: 'static + Send>(
        &mut self,
        value: T,
    ) -> Result<Box<dyn Any + Send>, RoutingError> {
        let mut current: Box<dyn Any + Send> = Box::new(value);
        loop {
            match self.step(current).await? {
                StepOutcome::Continue { value, .. } => current = value,
                StepOutcome::Done(value) => return Ok(value),
            }
        }
    }

    /// Apply the selection order to `value` once: forward-only filter,
    /// type filter, fence filter, explicit override, capability-overlap
    /// scoring, then the termination check.
    pub async fn step(
        &mut self,
        value: Box<dyn Any + Send>,
    ) -> Result<StepOutcome, RoutingError> {
        let value_type = (*value).type_id();

        let candidates: Vec<&BlockEntry> = self
            .registry
            .entries()
            .iter()
            .filter(|e| self.last_index.map_or(true, |last| e.index > last))
            .filter(|e| e.input_type == value_type)
            .filter(|e| self.fence.as_ref().map_or(true, |f| f.contains(&e.index)))
            .collect();

        if candidates.is_empty() {
            if value_type == self.target_type {
                return Ok(StepOutcome::Done(value));
            }
            return Err(RoutingError::NoProgress);
        }

        let selected = self
            .select_override(&candidates)
            .unwrap_or_else(|| self.select_by_overlap(&candidates));

        debug!(index = selected.index, block = selected.type_name, "selected");

        let output = match &selected.invoker {
            BlockInvoker::Instance(block) => {
                let resolved = self.instance_cache.get_or_insert(selected.index, block);
                resolved.invoke(value).await
            }
            BlockInvoker::Fn(_) => selected.invoker.invoke(value).await,
        };

        self.tags.record_executed(selected.type_name);
        self.tags.advance_epoch();
        self.last_index = Some(selected.index);

        Ok(StepOutcome::Continue {
            index: selected.index,
            type_name: selected.type_name,
            value: output,
        })
    }

    fn select_override<'c>(&self, candidates: &[&'c BlockEntry]) -> Option<&'c BlockEntry> {
        let overrides = self.tags.overrides();
        for ov in &overrides {
            if let Override::ByIndex(i) = ov {
                if let Some(entry) = candidates.iter().find(|c| c.index == *i) {
                    return Some(entry);
                }
            }
        }
        for ov in &overrides {
            if let Override::ByType(name) = ov {
                if let Some(entry) = candidates.iter().find(|c| c.type_name == name) {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Pick the candidate maximizing capability-tag overlap with the
    /// current epoch's visible tags, ties broken by lowest registry
    /// index (candidates already arrive in ascending index order).
    fn select_by_overlap<'c>(&self, candidates: &[&'c BlockEntry]) -> &'c BlockEntry {
        let mut best = candidates[0];
        let mut best_score = self.tags.overlap_count(&best.capabilities);
        for &candidate in &candidates[1..] {
            let score = self.tags.overlap_count(&candidate.capabilities);
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        best
    }
}

#[cfg(test)]
#[path = "ritual_tests.rs"]
mod tests;
