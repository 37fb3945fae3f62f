// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

struct Doubler;

#[async_trait]
impl AnyBlock for Doubler {
    async fn invoke(&self, input: Box<dyn Any + Send>) -> Box<dyn Any + Send> {
        let n = *input.downcast::<i32>().unwrap();
        Box::new(n * 2)
    }
}

#[tokio::test]
async fn instance_invoker_dispatches_to_the_trait_impl() {
    let invoker = BlockInvoker::instance(Arc::new(Doubler));
    let output = invoker.invoke(Box::new(21i32)).await;
    assert_eq!(*output.downcast::<i32>().unwrap(), 42);
}

#[tokio::test]
async fn fn_invoker_dispatches_to_the_closure() {
    let invoker = BlockInvoker::function(|input: Box<dyn Any + Send>| async move {
        let s = *input.downcast::<i32>().unwrap();
        Box::new(s.to_string()) as Box<dyn Any + Send>
    });
    let output = invoker.invoke(Box::new(7i32)).await;
    assert_eq!(*output.downcast::<String>().unwrap(), "7");
}
