//! Request pipeline: behaviors wrapped around a single request dispatch.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::compose;
use crate::context::Context;
use crate::error::MediatorError;
use crate::handler::{BoxFuture, RequestHandler};
use crate::message::{AnyResponse, BoxedRequest, MessageId, Request};

/// Outcome of a request chain: an erased response or a failure.
pub type Reply = std::result::Result<AnyResponse, Failure>;

/// A failed dispatch, optionally carrying a partial response.
///
/// Behaviors that can still offer useful data (stale cache, a default) attach
/// it as `partial`; the sender surfaces it next to the error when its type
/// matches the request's response type.
pub struct Failure {
    /// The error to report.
    pub error: MediatorError,
    /// Partial response, if any.
    pub partial: Option<AnyResponse>,
}

impl Failure {
    /// Failure without partial data.
    pub fn new(error: MediatorError) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    /// Failure carrying a partial response.
    pub fn with_partial<T: Any + Send>(error: MediatorError, partial: T) -> Self {
        Self {
            error,
            partial: Some(Box::new(partial)),
        }
    }
}

impl From<MediatorError> for Failure {
    fn from(error: MediatorError) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("error", &self.error)
            .field("partial", &self.partial.is_some())
            .finish()
    }
}

/// Single-shot continuation to the rest of the request chain.
///
/// Calling [`Next::run`] consumes it, so a behavior can invoke the rest of
/// the chain at most once. Dropping it without running short-circuits the
/// dispatch.
pub struct Next {
    inner: Box<dyn FnOnce(Context, BoxedRequest) -> BoxFuture<'static, Reply> + Send>,
}

impl Next {
    /// Create a continuation from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Context, BoxedRequest) -> BoxFuture<'static, Reply> + Send + 'static,
    {
        Self { inner: Box::new(f) }
    }

    /// Run the rest of the chain.
    pub fn run(self, ctx: Context, request: BoxedRequest) -> BoxFuture<'static, Reply> {
        (self.inner)(ctx, request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// Interceptor around every request dispatch.
///
/// A behavior may run logic before and after `next`, mutate the request, or
/// short-circuit by returning without calling `next`.
pub trait RequestBehavior: Send + Sync + 'static {
    /// Handle the request, usually by delegating to `next`.
    fn handle(&self, ctx: Context, request: BoxedRequest, next: Next) -> BoxFuture<'static, Reply>;
}

/// Reusable entry into one request handler for erased requests.
pub(crate) type RequestInvoker =
    Arc<dyn Fn(Context, BoxedRequest) -> BoxFuture<'static, Reply> + Send + Sync>;

/// Erase a typed handler. Requests of any type other than `R` fail with
/// [`MediatorError::HandlerTypeMismatch`].
pub(crate) fn invoker<R: Request>(handler: Arc<dyn RequestHandler<R>>) -> RequestInvoker {
    Arc::new(move |ctx, request: BoxedRequest| -> BoxFuture<'static, Reply> {
        let handler = handler.clone();
        Box::pin(async move {
            let request = match request.into_any().downcast::<R>() {
                Ok(request) => *request,
                Err(_) => {
                    return Err(Failure::new(MediatorError::HandlerTypeMismatch {
                        message: MessageId::of::<R>(),
                        expected: std::any::type_name::<R>(),
                    }))
                }
            };
            match handler.handle(ctx, request).await {
                Ok(response) => Ok(Box::new(response) as AnyResponse),
                Err(err) => Err(Failure::new(MediatorError::Handler(err))),
            }
        })
    })
}

/// Wrap `terminal` with the behaviors, first behavior outermost.
pub(crate) fn build_chain(behaviors: &[Arc<dyn RequestBehavior>], terminal: Next) -> Next {
    compose(behaviors, terminal, |next, behavior| {
        let behavior = behavior.clone();
        Next::new(move |ctx, request| behavior.handle(ctx, request, next))
    })
}
