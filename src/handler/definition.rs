//! Handler contracts and the definitions handed to the registries.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;
use crate::message::{MessageId, Notification, Request};
use crate::pipeline::request::{invoker, RequestInvoker};

/// Boxed future for handler and behavior results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type for handler bodies. Errors are opaque to the dispatcher.
pub type HandlerResult<T> = std::result::Result<T, BoxError>;

/// Handles exactly one request type.
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handle a request and produce its response.
    fn handle(&self, ctx: Context, request: R) -> BoxFuture<'static, HandlerResult<R::Response>>;
}

/// Handles one notification type. Several may be registered per type.
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Handle a notification.
    fn handle(&self, ctx: Context, notification: N) -> BoxFuture<'static, HandlerResult<()>>;
}

impl<R: Request, H: RequestHandler<R>> RequestHandler<R> for Arc<H> {
    fn handle(&self, ctx: Context, request: R) -> BoxFuture<'static, HandlerResult<R::Response>> {
        (**self).handle(ctx, request)
    }
}

impl<N: Notification, H: NotificationHandler<N>> NotificationHandler<N> for Arc<H> {
    fn handle(&self, ctx: Context, notification: N) -> BoxFuture<'static, HandlerResult<()>> {
        (**self).handle(ctx, notification)
    }
}

/// Adapter turning an async closure into a [`RequestHandler`].
pub struct FnRequestHandler<F, R, Fut>
where
    F: Fn(R, Context) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = HandlerResult<R::Response>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(R) -> Fut>,
}

impl<F, R, Fut> FnRequestHandler<F, R, Fut>
where
    F: Fn(R, Context) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = HandlerResult<R::Response>> + Send + 'static,
{
    /// Create a new closure handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, R, Fut> RequestHandler<R> for FnRequestHandler<F, R, Fut>
where
    F: Fn(R, Context) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = HandlerResult<R::Response>> + Send + 'static,
{
    fn handle(&self, ctx: Context, request: R) -> BoxFuture<'static, HandlerResult<R::Response>> {
        Box::pin((self.handler)(request, ctx))
    }
}

/// Adapter turning an async closure into a [`NotificationHandler`].
pub struct FnNotificationHandler<F, N, Fut>
where
    F: Fn(N, Context) -> Fut + Send + Sync + 'static,
    N: Notification,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(N) -> Fut>,
}

impl<F, N, Fut> FnNotificationHandler<F, N, Fut>
where
    F: Fn(N, Context) -> Fut + Send + Sync + 'static,
    N: Notification,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    /// Create a new closure handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, N, Fut> NotificationHandler<N> for FnNotificationHandler<F, N, Fut>
where
    F: Fn(N, Context) -> Fut + Send + Sync + 'static,
    N: Notification,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    fn handle(&self, ctx: Context, notification: N) -> BoxFuture<'static, HandlerResult<()>> {
        Box::pin((self.handler)(notification, ctx))
    }
}

/// A registered handler: its message identity plus the opaque handler value.
///
/// Request entries hold an `Arc<dyn RequestHandler<R>>`, notification entries
/// an `Arc<dyn NotificationHandler<N>>`, both behind `dyn Any`. The typed
/// accessors recover them; they return `None` when the stored value does not
/// satisfy the contract.
#[derive(Clone)]
pub struct HandlerEntry {
    message: MessageId,
    handler: Arc<dyn Any + Send + Sync>,
    name: &'static str,
    invoker: Option<RequestInvoker>,
}

impl HandlerEntry {
    /// Message identity this handler is registered for.
    #[inline]
    pub fn message_id(&self) -> MessageId {
        self.message
    }

    /// Type name of the handler, for logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Recover the typed request handler.
    pub fn request_handler<R: Request>(&self) -> Option<&Arc<dyn RequestHandler<R>>> {
        self.handler.downcast_ref::<Arc<dyn RequestHandler<R>>>()
    }

    /// Entry for erased requests, present on request entries built from a
    /// typed handler.
    pub(crate) fn request_invoker(&self) -> Option<&RequestInvoker> {
        self.invoker.as_ref()
    }

    /// Recover the typed notification handler.
    pub fn notification_handler<N: Notification>(&self) -> Option<&Arc<dyn NotificationHandler<N>>> {
        self.handler.downcast_ref::<Arc<dyn NotificationHandler<N>>>()
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("message", &self.message)
            .field("handler", &self.name)
            .finish()
    }
}

/// A request handler together with the request type it serves.
#[derive(Clone, Debug)]
pub struct RequestHandlerDefinition {
    entry: HandlerEntry,
}

impl RequestHandlerDefinition {
    /// Define a handler for request type `R`.
    pub fn new<R: Request, H: RequestHandler<R>>(handler: H) -> Self {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        Self {
            entry: HandlerEntry {
                message: MessageId::of::<R>(),
                handler: Arc::new(handler.clone()),
                name: std::any::type_name::<H>(),
                invoker: Some(invoker::<R>(handler)),
            },
        }
    }

    /// Define a closure handler for request type `R`.
    pub fn from_fn<R, F, Fut>(handler: F) -> Self
    where
        R: Request,
        F: Fn(R, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R::Response>> + Send + 'static,
    {
        let mut definition = Self::new::<R, _>(FnRequestHandler::new(handler));
        definition.entry.name = std::any::type_name::<F>();
        definition
    }

    /// Build a definition from an identity and an opaque handler value.
    ///
    /// The value should be an `Arc<dyn RequestHandler<R>>` for the request
    /// type identified by `message`; anything else fails at dispatch time with
    /// [`MediatorError::HandlerTypeMismatch`](crate::MediatorError::HandlerTypeMismatch).
    pub fn from_parts(
        message: MessageId,
        handler: Arc<dyn Any + Send + Sync>,
        name: &'static str,
    ) -> Self {
        Self {
            entry: HandlerEntry {
                message,
                handler,
                name,
                invoker: None,
            },
        }
    }

    /// Request identity.
    #[inline]
    pub fn message_id(&self) -> MessageId {
        self.entry.message
    }

    /// Consume into the registry entry.
    pub fn into_entry(self) -> HandlerEntry {
        self.entry
    }
}

/// A notification handler together with the notification type it serves.
#[derive(Clone, Debug)]
pub struct NotificationHandlerDefinition {
    entry: HandlerEntry,
}

impl NotificationHandlerDefinition {
    /// Define a handler for notification type `N`.
    pub fn new<N: Notification, H: NotificationHandler<N>>(handler: H) -> Self {
        let handler: Arc<dyn NotificationHandler<N>> = Arc::new(handler);
        Self {
            entry: HandlerEntry {
                message: MessageId::of::<N>(),
                handler: Arc::new(handler),
                name: std::any::type_name::<H>(),
                invoker: None,
            },
        }
    }

    /// Define a closure handler for notification type `N`.
    pub fn from_fn<N, F, Fut>(handler: F) -> Self
    where
        N: Notification,
        F: Fn(N, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        let mut definition = Self::new::<N, _>(FnNotificationHandler::new(handler));
        definition.entry.name = std::any::type_name::<F>();
        definition
    }

    /// Build a definition from an identity and an opaque handler value.
    ///
    /// The value should be an `Arc<dyn NotificationHandler<N>>`.
    pub fn from_parts(
        message: MessageId,
        handler: Arc<dyn Any + Send + Sync>,
        name: &'static str,
    ) -> Self {
        Self {
            entry: HandlerEntry {
                message,
                handler,
                name,
                invoker: None,
            },
        }
    }

    /// Notification identity.
    #[inline]
    pub fn message_id(&self) -> MessageId {
        self.entry.message
    }

    /// Consume into the registry entry.
    pub fn into_entry(self) -> HandlerEntry {
        self.entry
    }
}
