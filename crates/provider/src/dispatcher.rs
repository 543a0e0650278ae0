use async_trait::async_trait;
use refire_core::{DispatchResult, TransactionId};

/// Strongly-typed dispatcher trait with native `async fn`.
///
/// A dispatcher performs exactly one downstream call per invocation and
/// classifies what happened. It never retries and never panics on I/O
/// failure: every outcome is a [`DispatchResult`] value.
///
/// This trait is **not** object-safe because it uses native `async fn`
/// methods. If you need dynamic dispatch, use [`DynDispatcher`] instead --
/// every `Dispatcher` automatically implements `DynDispatcher` via a blanket
/// implementation.
pub trait Dispatcher: Send + Sync {
    /// Returns the name of this dispatcher, used in logs.
    fn name(&self) -> &str;

    /// Trigger the downstream call for one transaction.
    fn dispatch(
        &self,
        id: &TransactionId,
    ) -> impl std::future::Future<Output = DispatchResult> + Send;
}

/// Object-safe dispatcher trait for use behind `Arc<dyn DynDispatcher>`.
///
/// You generally should not implement this trait directly -- implement
/// [`Dispatcher`] and rely on the blanket implementation.
#[async_trait]
pub trait DynDispatcher: Send + Sync {
    /// Returns the name of this dispatcher, used in logs.
    fn name(&self) -> &str;

    /// Trigger the downstream call for one transaction.
    async fn dispatch(&self, id: &TransactionId) -> DispatchResult;
}

#[async_trait]
impl<T: Dispatcher + Sync> DynDispatcher for T {
    fn name(&self) -> &str {
        Dispatcher::name(self)
    }

    async fn dispatch(&self, id: &TransactionId) -> DispatchResult {
        Dispatcher::dispatch(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct MockDispatcher {
        calls: AtomicU32,
        fail: bool,
    }

    impl MockDispatcher {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }
    }

    impl Dispatcher for MockDispatcher {
        fn name(&self) -> &str {
            "mock"
        }

        async fn dispatch(&self, _id: &TransactionId) -> DispatchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                DispatchResult::transport("mock failure")
            } else {
                DispatchResult::delivered(200)
            }
        }
    }

    #[tokio::test]
    async fn dispatch_success() {
        let dispatcher = MockDispatcher::new(false);
        let result = Dispatcher::dispatch(&dispatcher, &TransactionId::new("1")).await;
        assert_eq!(result, DispatchResult::delivered(200));
    }

    #[tokio::test]
    async fn dispatch_failure_is_a_value() {
        let dispatcher = MockDispatcher::new(true);
        let result = Dispatcher::dispatch(&dispatcher, &TransactionId::new("1")).await;
        assert_eq!(result.kind(), "transport_failure");
    }

    #[tokio::test]
    async fn blanket_dyn_dispatcher_impl() {
        let mock = Arc::new(MockDispatcher::new(false));
        let dispatcher: Arc<dyn DynDispatcher> = Arc::clone(&mock) as Arc<dyn DynDispatcher>;
        assert_eq!(dispatcher.name(), "mock");

        dispatcher.dispatch(&TransactionId::new("a")).await;
        dispatcher.dispatch(&TransactionId::new("a")).await;
        assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
    }
}
