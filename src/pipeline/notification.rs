//! Notification pipeline: per-handler and whole-fan-out behaviors.

use std::fmt;
use std::sync::Arc;

use super::compose;
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, HandlerEntry, HandlerSet};
use crate::message::SharedNotification;

/// Reusable continuation invoking one notification handler.
///
/// Strategies call it once per resolved handler. It is cheap to clone and can
/// be moved into spawned tasks.
#[derive(Clone)]
pub struct Launcher {
    inner: Arc<dyn Fn(Context, HandlerEntry) -> BoxFuture<'static, Result<()>> + Send + Sync>,
}

impl Launcher {
    /// Create a launcher from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Context, HandlerEntry) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the handler.
    pub fn launch(&self, ctx: Context, handler: HandlerEntry) -> BoxFuture<'static, Result<()>> {
        (self.inner)(ctx, handler)
    }
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Launcher")
    }
}

/// Single-shot continuation running the publish strategy.
pub struct StrategyNext {
    inner: Box<dyn FnOnce(Context) -> BoxFuture<'static, Result<()>> + Send>,
}

impl StrategyNext {
    /// Create a continuation from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Context) -> BoxFuture<'static, Result<()>> + Send + 'static,
    {
        Self { inner: Box::new(f) }
    }

    /// Run the rest of the fan-out.
    pub fn run(self, ctx: Context) -> BoxFuture<'static, Result<()>> {
        (self.inner)(ctx)
    }
}

impl fmt::Debug for StrategyNext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StrategyNext")
    }
}

/// Interceptor around each individual notification handler call.
///
/// Applied identically to every handler of the fan-out, whatever the
/// strategy.
pub trait NotificationBehavior: Send + Sync + 'static {
    /// Handle one (notification, handler) pair, usually by calling `next`.
    fn handle(
        &self,
        ctx: Context,
        notification: SharedNotification,
        handler: HandlerEntry,
        next: Launcher,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Interceptor around a whole notification fan-out.
pub trait StrategyBehavior: Send + Sync + 'static {
    /// Handle the fan-out, usually by calling `next`.
    fn handle(
        &self,
        ctx: Context,
        notification: SharedNotification,
        handlers: HandlerSet,
        next: StrategyNext,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Wrap the raw launcher with per-handler behaviors, first outermost.
pub(crate) fn wrap_launcher(
    behaviors: &[Arc<dyn NotificationBehavior>],
    notification: &SharedNotification,
    launcher: Launcher,
) -> Launcher {
    compose(behaviors, launcher, |next, behavior| {
        let behavior = behavior.clone();
        let notification = notification.clone();
        Launcher::new(move |ctx, handler| {
            behavior.handle(ctx, notification.clone(), handler, next.clone())
        })
    })
}

/// Wrap the strategy run with strategy behaviors, first outermost.
pub(crate) fn wrap_strategy(
    behaviors: &[Arc<dyn StrategyBehavior>],
    notification: &SharedNotification,
    handlers: &HandlerSet,
    run: StrategyNext,
) -> StrategyNext {
    compose(behaviors, run, |next, behavior| {
        let behavior = behavior.clone();
        let notification = notification.clone();
        let handlers = handlers.clone();
        StrategyNext::new(move |ctx| behavior.handle(ctx, notification, handlers, next))
    })
}
