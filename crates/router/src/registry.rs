// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry of blocks a ritual selects from. Immutable once a
//! ritual starts — `Ritual` borrows `&BlockRegistry` rather than taking
//! an owned, mutable copy, so registration and execution can never
//! interleave.
//!
//! Grounded on `crates/engine/src/executor.rs`'s `match effect { ... }`
//! typed dispatch, generalized from a closed enum match to an open
//! runtime registry populated at startup.

use std::any::TypeId;

use crate::invoker::BlockInvoker;

/// One block's registration: its declared input/output types, its
/// capability tags, and how to invoke it.
pub struct BlockEntry {
    pub index: usize,
    pub input_type: TypeId,
    pub output_type: TypeId,
    pub type_name: &'static str,
    pub capabilities: Vec<String>,
    pub invoker: BlockInvoker,
}

/// An append-only collection of `BlockEntry`s, indexed by registration
/// order. The forward-only selection rule makes registration order the
/// ritual's one progress measure.
#[derive(Default)]
pub struct BlockRegistry {
    entries: Vec<BlockEntry>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block taking `In` and producing `Out`, tagged with
    /// `capabilities`. Returns the assigned registry index.
    pub fn register<In, Out>(
        &mut self,
        type_name: &'static str,
        capabilities: impl IntoIterator<Item = impl Into<String>>,
        invoker: BlockInvoker,
    ) -> usize
    where
        In: 'static,
        Out: 'static,
    {
        let index = self.entries.len();
        self.entries.push(BlockEntry {
            index,
            input_type: TypeId::of::<In>(),
            output_type: TypeId::of::<Out>(),
            type_name,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            invoker,
        });
        index
    }

    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    pub fn find_by_type_name(&self, type_name: &str) -> Option<&BlockEntry> {
        self.entries.iter().find(|e| e.type_name == type_name)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
