//! Panic recovery behaviors.
//!
//! Both behaviors poll the rest of the chain inside `catch_unwind`, so a panic
//! raised while building or polling the continuation surfaces as
//! [`MediatorError::Panicked`] instead of unwinding into the caller.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::context::Context;
use crate::error::{MediatorError, Result};
use crate::handler::{BoxFuture, HandlerSet};
use crate::message::{BoxedRequest, SharedNotification};
use crate::pipeline::{Failure, Next, Reply, RequestBehavior, StrategyBehavior, StrategyNext};

/// Converts panics in the request chain into [`MediatorError::Panicked`].
///
/// Place it first in the behavior list to cover every later behavior and the
/// handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverRequestBehavior;

impl RequestBehavior for RecoverRequestBehavior {
    fn handle(&self, ctx: Context, request: BoxedRequest, next: Next) -> BoxFuture<'static, Reply> {
        let message = request.message_id();
        Box::pin(async move {
            match AssertUnwindSafe(async move { next.run(ctx, request).await })
                .catch_unwind()
                .await
            {
                Ok(reply) => reply,
                Err(payload) => {
                    let err = MediatorError::from_panic(payload);
                    tracing::error!(request = %message, error = %err, "Request handler panicked");
                    Err(Failure::new(err))
                }
            }
        })
    }
}

/// Converts panics anywhere in a notification fan-out into
/// [`MediatorError::Panicked`].
///
/// Wraps the whole strategy run, so a panic in a sequential handler stops the
/// fan-out the same way an error would.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverStrategyBehavior;

impl StrategyBehavior for RecoverStrategyBehavior {
    fn handle(
        &self,
        ctx: Context,
        notification: SharedNotification,
        _handlers: HandlerSet,
        next: StrategyNext,
    ) -> BoxFuture<'static, Result<()>> {
        let message = notification.message_id();
        Box::pin(async move {
            match AssertUnwindSafe(async move { next.run(ctx).await })
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => {
                    let err = MediatorError::from_panic(payload);
                    tracing::error!(notification = %message, error = %err, "Notification fan-out panicked");
                    Err(err)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AnyResponse, Notification, Request};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Explode;

    impl Request for Explode {
        type Response = ();
    }

    #[derive(Debug, Clone)]
    struct Alarm;

    impl Notification for Alarm {}

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[tokio::test]
    async fn test_recovers_panic_while_polling() {
        let next = Next::new(|_ctx, _req| Box::pin(async { panic!("deep failure") }));

        let failure = RecoverRequestBehavior
            .handle(Context::new(), Box::new(Explode), next)
            .await
            .unwrap_err();

        assert!(failure.error.is_panic());
        assert_eq!(failure.error.to_string(), "recovered from panic: deep failure");
        assert!(failure.partial.is_none());
    }

    #[tokio::test]
    async fn test_recovers_panic_while_building() {
        let next = Next::new(|_ctx, _req| -> BoxFuture<'static, Reply> {
            panic!("{} broke", "builder");
        });

        let failure = RecoverRequestBehavior
            .handle(Context::new(), Box::new(Explode), next)
            .await
            .unwrap_err();

        assert_eq!(failure.error.to_string(), "recovered from panic: builder broke");
    }

    #[tokio::test]
    async fn test_error_payload_kept_as_source() {
        let next = Next::new(|_ctx, _req| {
            Box::pin(async {
                std::panic::panic_any(MediatorError::handler(DiskFull));
            })
        });

        let failure = RecoverRequestBehavior
            .handle(Context::new(), Box::new(Explode), next)
            .await
            .unwrap_err();

        match failure.error {
            MediatorError::Panicked { message, source, .. } => {
                assert_eq!(message, "disk full");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concrete_payload_recoverable() {
        let next = Next::new(|_ctx, _req| {
            Box::pin(async {
                std::panic::panic_any(DiskFull);
            })
        });

        let failure = RecoverRequestBehavior
            .handle(Context::new(), Box::new(Explode), next)
            .await
            .unwrap_err();

        assert!(failure.error.is_panic());
        let payload = failure.error.panic_payload().unwrap();
        assert!(payload.downcast::<DiskFull>().is_some());
    }

    #[tokio::test]
    async fn test_strategy_concrete_payload_recoverable() {
        let next = StrategyNext::new(|_ctx| {
            Box::pin(async {
                std::panic::panic_any(DiskFull);
            })
        });
        let handlers: HandlerSet = Vec::new().into();

        let err = RecoverStrategyBehavior
            .handle(Context::new(), Arc::new(Alarm), handlers, next)
            .await
            .unwrap_err();

        assert!(err.panic_payload().is_some_and(|p| p.is::<DiskFull>()));
    }

    #[tokio::test]
    async fn test_passes_through_without_panic() {
        let next = Next::new(|_ctx, _req| Box::pin(async { Ok(Box::new(5u32) as AnyResponse) }));

        let reply = RecoverRequestBehavior
            .handle(Context::new(), Box::new(Explode), next)
            .await
            .unwrap();

        assert_eq!(*reply.downcast::<u32>().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_strategy_recovery() {
        let next = StrategyNext::new(|_ctx| Box::pin(async { panic!("fan-out failed") }));
        let handlers: HandlerSet = Vec::new().into();

        let err = RecoverStrategyBehavior
            .handle(Context::new(), Arc::new(Alarm), handlers, next)
            .await
            .unwrap_err();

        assert!(err.is_panic());
        assert_eq!(err.to_string(), "recovered from panic: fan-out failed");
    }

    #[tokio::test]
    async fn test_strategy_error_untouched() {
        let next = StrategyNext::new(|_ctx| Box::pin(async { Err(MediatorError::handler(DiskFull)) }));
        let handlers: HandlerSet = Vec::new().into();

        let err = RecoverStrategyBehavior
            .handle(Context::new(), Arc::new(Alarm), handlers, next)
            .await
            .unwrap_err();

        assert!(!err.is_panic());
        assert!(err.downcast_ref::<DiskFull>().is_some());
    }
}
