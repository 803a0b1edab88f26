//! Timing and logging behaviors.
//!
//! Each behavior measures the time spent in the rest of its chain and hands a
//! record to a callback. The `tracing()` constructors install callbacks that
//! emit `info` on success and `error` on failure. The observed result is
//! always returned unchanged.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::Context;
use crate::error::{MediatorError, Result};
use crate::handler::{BoxFuture, HandlerEntry, HandlerSet};
use crate::message::{BoxedRequest, ErasedNotification, MessageId, SharedNotification};
use crate::pipeline::{
    Launcher, Next, NotificationBehavior, Reply, RequestBehavior, StrategyBehavior, StrategyNext,
};

/// One request dispatch, as seen by [`LogRequestBehavior`].
#[derive(Debug)]
pub struct RequestLogRecord<'a> {
    /// Request type.
    pub message: MessageId,
    /// Debug rendering of the request, taken before dispatch.
    pub request: &'a str,
    /// Time spent in the rest of the chain.
    pub elapsed: Duration,
    /// Failure, if any.
    pub error: Option<&'a MediatorError>,
}

/// One notification handler call, as seen by [`LogNotificationBehavior`].
#[derive(Debug)]
pub struct NotificationLogRecord<'a> {
    /// Notification type.
    pub message: MessageId,
    /// The notification being delivered.
    pub notification: &'a dyn ErasedNotification,
    /// The handler that was invoked.
    pub handler: &'a HandlerEntry,
    /// Time spent in the rest of the chain.
    pub elapsed: Duration,
    /// Failure, if any.
    pub error: Option<&'a MediatorError>,
}

/// One whole fan-out, as seen by [`LogStrategyBehavior`].
#[derive(Debug)]
pub struct StrategyLogRecord<'a> {
    /// Notification type.
    pub message: MessageId,
    /// The notification being published.
    pub notification: &'a dyn ErasedNotification,
    /// Handlers handed to the strategy, in registration order.
    pub handlers: &'a [HandlerEntry],
    /// Time spent in the whole fan-out.
    pub elapsed: Duration,
    /// Failure, if any.
    pub error: Option<&'a MediatorError>,
}

type RequestLogFn = Arc<dyn for<'a> Fn(&Context, &RequestLogRecord<'a>) + Send + Sync>;
type NotificationLogFn = Arc<dyn for<'a> Fn(&Context, &NotificationLogRecord<'a>) + Send + Sync>;
type StrategyLogFn = Arc<dyn for<'a> Fn(&Context, &StrategyLogRecord<'a>) + Send + Sync>;

/// Logs every request dispatch.
#[derive(Clone)]
pub struct LogRequestBehavior {
    log: RequestLogFn,
}

impl LogRequestBehavior {
    /// Log through a custom callback.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&Context, &RequestLogRecord<'a>) + Send + Sync + 'static,
    {
        Self { log: Arc::new(f) }
    }

    /// Log through `tracing`.
    pub fn tracing() -> Self {
        Self::new(|_ctx, record| match record.error {
            None => tracing::info!(
                request = %record.message,
                payload = record.request,
                elapsed_us = record.elapsed.as_micros() as u64,
                "Processing request succeeded"
            ),
            Some(err) => tracing::error!(
                request = %record.message,
                payload = record.request,
                elapsed_us = record.elapsed.as_micros() as u64,
                error = %err,
                "Processing request failed"
            ),
        })
    }
}

impl Default for LogRequestBehavior {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for LogRequestBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogRequestBehavior")
    }
}

impl RequestBehavior for LogRequestBehavior {
    fn handle(&self, ctx: Context, request: BoxedRequest, next: Next) -> BoxFuture<'static, Reply> {
        let log = self.log.clone();
        Box::pin(async move {
            let message = request.message_id();
            let rendered = format!("{request:?}");
            let start = Instant::now();
            let reply = next.run(ctx.clone(), request).await;
            let record = RequestLogRecord {
                message,
                request: &rendered,
                elapsed: start.elapsed(),
                error: reply.as_ref().err().map(|failure| &failure.error),
            };
            log(&ctx, &record);
            reply
        })
    }
}

/// Logs every individual notification handler call.
#[derive(Clone)]
pub struct LogNotificationBehavior {
    log: NotificationLogFn,
}

impl LogNotificationBehavior {
    /// Log through a custom callback.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&Context, &NotificationLogRecord<'a>) + Send + Sync + 'static,
    {
        Self { log: Arc::new(f) }
    }

    /// Log through `tracing`.
    pub fn tracing() -> Self {
        Self::new(|_ctx, record| match record.error {
            None => tracing::info!(
                notification = %record.message,
                payload = ?record.notification,
                handler = record.handler.name(),
                elapsed_us = record.elapsed.as_micros() as u64,
                "Notification handler succeeded"
            ),
            Some(err) => tracing::error!(
                notification = %record.message,
                payload = ?record.notification,
                handler = record.handler.name(),
                elapsed_us = record.elapsed.as_micros() as u64,
                error = %err,
                "Notification handler failed"
            ),
        })
    }
}

impl Default for LogNotificationBehavior {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for LogNotificationBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogNotificationBehavior")
    }
}

impl NotificationBehavior for LogNotificationBehavior {
    fn handle(
        &self,
        ctx: Context,
        notification: SharedNotification,
        handler: HandlerEntry,
        next: Launcher,
    ) -> BoxFuture<'static, Result<()>> {
        let log = self.log.clone();
        Box::pin(async move {
            let start = Instant::now();
            let result = next.launch(ctx.clone(), handler.clone()).await;
            let record = NotificationLogRecord {
                message: notification.message_id(),
                notification: notification.as_ref(),
                handler: &handler,
                elapsed: start.elapsed(),
                error: result.as_ref().err(),
            };
            log(&ctx, &record);
            result
        })
    }
}

/// Logs every notification fan-out as a whole.
#[derive(Clone)]
pub struct LogStrategyBehavior {
    log: StrategyLogFn,
}

impl LogStrategyBehavior {
    /// Log through a custom callback.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&Context, &StrategyLogRecord<'a>) + Send + Sync + 'static,
    {
        Self { log: Arc::new(f) }
    }

    /// Log through `tracing`.
    pub fn tracing() -> Self {
        Self::new(|_ctx, record| match record.error {
            None => tracing::info!(
                notification = %record.message,
                payload = ?record.notification,
                handlers = record.handlers.len(),
                elapsed_us = record.elapsed.as_micros() as u64,
                "Publishing notification succeeded"
            ),
            Some(err) => tracing::error!(
                notification = %record.message,
                payload = ?record.notification,
                handlers = record.handlers.len(),
                elapsed_us = record.elapsed.as_micros() as u64,
                error = %err,
                "Publishing notification failed"
            ),
        })
    }
}

impl Default for LogStrategyBehavior {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for LogStrategyBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogStrategyBehavior")
    }
}

impl StrategyBehavior for LogStrategyBehavior {
    fn handle(
        &self,
        ctx: Context,
        notification: SharedNotification,
        handlers: HandlerSet,
        next: StrategyNext,
    ) -> BoxFuture<'static, Result<()>> {
        let log = self.log.clone();
        Box::pin(async move {
            let start = Instant::now();
            let result = next.run(ctx.clone()).await;
            let record = StrategyLogRecord {
                message: notification.message_id(),
                notification: notification.as_ref(),
                handlers: &handlers,
                elapsed: start.elapsed(),
                error: result.as_ref().err(),
            };
            log(&ctx, &record);
            result
        })
    }
}
