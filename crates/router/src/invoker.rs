// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The uniform `(instance, input) -> output` contract a block is
//! invoked through, regardless of whether it was registered as a class
//! instance or a pure function.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

/// A future boxed for storage in a trait object, without pulling in the
/// `futures` crate for a single type alias.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A stateful block resolved to a class instance. Implementations own
/// whatever state the block's capability needs across invocations.
#[async_trait]
pub trait AnyBlock: Send + Sync {
    async fn invoke(&self, input: Box<dyn Any + Send>) -> Box<dyn Any + Send>;
}

/// How a registered block is actually called.
pub enum BlockInvoker {
    /// A resolved, possibly stateful, instance.
    Instance(Arc<dyn AnyBlock>),
    /// A pure function with no instance state.
    Fn(Box<dyn Fn(Box<dyn Any + Send>) -> BoxFuture<'static, Box<dyn Any + Send>> + Send + Sync>),
}

impl BlockInvoker {
    pub fn instance(block: Arc<dyn AnyBlock>) -> Self {
        BlockInvoker::Instance(block)
    }

    pub fn function<F, Fut>(f: F) -> Self
    where
        F: Fn(Box<dyn Any + Send>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Box<dyn Any + Send>> + Send + 'static,
    {
        BlockInvoker::Fn(Box::new(move |input| Box::pin(f(input))))
    }

    pub(crate) async fn invoke(&self, input: Box<dyn Any + Send>) -> Box<dyn Any + Send> {
        match self {
            BlockInvoker::Instance(block) => block.invoke(input).await,
            BlockInvoker::Fn(f) => f(input).await,
        }
    }
}

#[cfg(test)]
#[path = "invoker_tests.rs"]
mod tests;
