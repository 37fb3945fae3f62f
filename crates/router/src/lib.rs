// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! coven-router: a forward-only, type-directed pipeline over a registry
//! of typed blocks, selected by capability tags.

pub mod error;
pub mod invoker;
pub mod registry;
pub mod ritual;

pub use coven_core::TagScope;
pub use error::RoutingError;
pub use invoker::{AnyBlock, BlockInvoker, BoxFuture};
pub use registry::{BlockEntry, BlockRegistry};
pub use ritual::{Ritual, StepOutcome};
