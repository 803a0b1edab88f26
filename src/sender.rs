//! Request dispatch.
//!
//! A [`Sender`] owns an immutable [`RequestRegistry`] and an ordered list of
//! [`RequestBehavior`]s. Each `send` resolves the single handler for the
//! request type, wraps it with the behaviors (first behavior outermost) and
//! runs the chain exactly once on the caller's task.
//!
//! # Example
//!
//! ```
//! use mediator::{Context, Request, Sender};
//!
//! #[derive(Debug)]
//! struct Add(u32, u32);
//!
//! impl Request for Add {
//!     type Response = u32;
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sender = Sender::builder()
//!     .handle(|req: Add, _ctx| async move { Ok(req.0 + req.1) })
//!     .build();
//!
//! let sum = sender.send(Context::new(), Add(2, 3)).await.unwrap();
//! assert_eq!(sum, 5);
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::MediatorSettings;
use crate::context::Context;
use crate::error::{MediatorError, Result};
use crate::handler::{HandlerResult, RequestHandler, RequestHandlerDefinition, RequestRegistry};
use crate::message::{BoxedRequest, MessageId, Request};
use crate::pipeline::request::{build_chain, invoker};
use crate::pipeline::{Failure, Next, Reply, RequestBehavior};

/// Everything a [`Sender`] is built from.
#[derive(Clone, Default)]
pub struct SenderConfig {
    /// Request handlers. A later definition for the same request type
    /// replaces an earlier one.
    pub handlers: Vec<RequestHandlerDefinition>,
    /// Behaviors, first outermost.
    pub behaviors: Vec<Arc<dyn RequestBehavior>>,
}

/// Failed dispatch with the typed partial response, if one was produced.
pub struct PartialFailure<T> {
    /// What went wrong.
    pub error: MediatorError,
    /// Partial response attached by a behavior, when its type matched.
    pub partial: Option<T>,
}

impl<T> PartialFailure<T> {
    fn new(error: MediatorError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

impl<T> From<MediatorError> for PartialFailure<T> {
    fn from(error: MediatorError) -> Self {
        Self::new(error)
    }
}

impl<T> From<PartialFailure<T>> for MediatorError {
    fn from(failure: PartialFailure<T>) -> Self {
        failure.error
    }
}

impl<T> fmt::Debug for PartialFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialFailure")
            .field("error", &self.error)
            .field("partial", &self.partial.is_some())
            .finish()
    }
}

impl<T> fmt::Display for PartialFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> std::error::Error for PartialFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Dispatches requests to their single handler through the request pipeline.
///
/// Cheap to clone; clones share the registry and behaviors.
#[derive(Clone)]
pub struct Sender {
    registry: Arc<RequestRegistry>,
    behaviors: Arc<[Arc<dyn RequestBehavior>]>,
}

impl Sender {
    /// Build a sender from its configuration.
    pub fn new(config: SenderConfig) -> Self {
        Self {
            registry: Arc::new(RequestRegistry::new(config.handlers)),
            behaviors: config.behaviors.into(),
        }
    }

    /// Start a fluent builder.
    pub fn builder() -> SenderBuilder {
        SenderBuilder::new()
    }

    /// The handler registry.
    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    /// Dispatch `request` and return its response.
    pub async fn send<R: Request>(&self, ctx: Context, request: R) -> Result<R::Response> {
        self.send_with_partial(ctx, request)
            .await
            .map_err(|failure| failure.error)
    }

    /// Dispatch `request`, keeping any partial response a behavior attached
    /// to a failure.
    pub async fn send_with_partial<R: Request>(
        &self,
        ctx: Context,
        request: R,
    ) -> std::result::Result<R::Response, PartialFailure<R::Response>> {
        let message = MessageId::of::<R>();
        let entry = self
            .registry
            .resolve(message)
            .ok_or(MediatorError::NoHandlerFound(message))?;
        let handler = entry.request_handler::<R>().cloned().ok_or_else(|| {
            MediatorError::HandlerTypeMismatch {
                message,
                expected: std::any::type_name::<dyn RequestHandler<R>>(),
            }
        })?;

        let invoke = invoker::<R>(handler);
        let terminal = Next::new(move |ctx, request| invoke(ctx, request));

        let chain = build_chain(&self.behaviors, terminal);
        match chain.run(ctx, Box::new(request)).await {
            Ok(response) => match response.downcast::<R::Response>() {
                Ok(response) => Ok(*response),
                Err(_) => Err(PartialFailure::new(MediatorError::HandlerTypeMismatch {
                    message,
                    expected: std::any::type_name::<R::Response>(),
                })),
            },
            Err(Failure { error, partial }) => Err(PartialFailure {
                error,
                partial: partial
                    .and_then(|partial| partial.downcast::<R::Response>().ok())
                    .map(|partial| *partial),
            }),
        }
    }

    /// Dispatch a request whose type is only known at runtime.
    ///
    /// The handler is resolved by the request's own identity and the
    /// response comes back erased. Handlers registered through
    /// [`RequestHandlerDefinition::from_parts`] have no erased entry point
    /// and fail with [`MediatorError::HandlerTypeMismatch`].
    pub async fn send_boxed(&self, ctx: Context, request: BoxedRequest) -> Reply {
        let message = request.message_id();
        let entry = self
            .registry
            .resolve(message)
            .ok_or(MediatorError::NoHandlerFound(message))?;
        let invoke = entry.request_invoker().cloned().ok_or_else(|| {
            MediatorError::HandlerTypeMismatch {
                message,
                expected: "typed request handler",
            }
        })?;

        let terminal = Next::new(move |ctx, request| invoke(ctx, request));
        build_chain(&self.behaviors, terminal).run(ctx, request).await
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("handlers", &self.registry.len())
            .field("behaviors", &self.behaviors.len())
            .finish()
    }
}

/// Fluent builder for [`Sender`].
#[derive(Default)]
pub struct SenderBuilder {
    config: SenderConfig,
}

impl SenderBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for request type `R`.
    pub fn handler<R: Request, H: RequestHandler<R>>(self, handler: H) -> Self {
        self.definition(RequestHandlerDefinition::new::<R, H>(handler))
    }

    /// Register an async closure for request type `R`.
    pub fn handle<R, F, Fut>(self, handler: F) -> Self
    where
        R: Request,
        F: Fn(R, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R::Response>> + Send + 'static,
    {
        self.definition(RequestHandlerDefinition::from_fn(handler))
    }

    /// Register a prepared definition.
    pub fn definition(mut self, definition: RequestHandlerDefinition) -> Self {
        self.config.handlers.push(definition);
        self
    }

    /// Append a behavior. Behaviors added first run outermost.
    pub fn behavior(mut self, behavior: impl RequestBehavior) -> Self {
        self.config.behaviors.push(Arc::new(behavior));
        self
    }

    /// Append already shared behaviors.
    pub fn behaviors(mut self, behaviors: impl IntoIterator<Item = Arc<dyn RequestBehavior>>) -> Self {
        self.config.behaviors.extend(behaviors);
        self
    }

    /// Append the request behaviors enabled in `settings`.
    pub fn settings(self, settings: &MediatorSettings) -> Self {
        self.behaviors(settings.request_behaviors())
    }

    /// Build the sender.
    pub fn build(self) -> Sender {
        Sender::new(self.config)
    }
}
