//! The [`Mediator`] facade: request dispatch and notification fan-out behind
//! one cloneable handle.

use std::future::Future;

use crate::config::MediatorSettings;
use crate::context::Context;
use crate::error::Result;
use crate::handler::{
    HandlerResult, NotificationHandler, NotificationHandlerDefinition, RequestHandler,
    RequestHandlerDefinition,
};
use crate::message::{BoxedRequest, Notification, Request};
use crate::pipeline::{NotificationBehavior, Reply, RequestBehavior, StrategyBehavior};
use crate::publisher::{Publisher, PublisherBuilder};
use crate::sender::{PartialFailure, Sender, SenderBuilder};
use crate::strategy::PublishStrategy;

/// A [`Sender`] and a [`Publisher`] used together.
#[derive(Debug, Clone)]
pub struct Mediator {
    sender: Sender,
    publisher: Publisher,
}

impl Mediator {
    /// Combine an existing sender and publisher.
    pub fn new(sender: Sender, publisher: Publisher) -> Self {
        Self { sender, publisher }
    }

    /// Start a fluent builder.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// The request side.
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// The notification side.
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// See [`Sender::send`].
    pub async fn send<R: Request>(&self, ctx: Context, request: R) -> Result<R::Response> {
        self.sender.send(ctx, request).await
    }

    /// See [`Sender::send_with_partial`].
    pub async fn send_with_partial<R: Request>(
        &self,
        ctx: Context,
        request: R,
    ) -> std::result::Result<R::Response, PartialFailure<R::Response>> {
        self.sender.send_with_partial(ctx, request).await
    }

    /// See [`Sender::send_boxed`].
    pub async fn send_boxed(&self, ctx: Context, request: BoxedRequest) -> Reply {
        self.sender.send_boxed(ctx, request).await
    }

    /// See [`Publisher::publish`].
    pub async fn publish<N: Notification>(&self, ctx: Context, notification: N) -> Result<()> {
        self.publisher.publish(ctx, notification).await
    }
}

/// Fluent builder for [`Mediator`].
#[derive(Default)]
pub struct MediatorBuilder {
    sender: SenderBuilder,
    publisher: PublisherBuilder,
}

impl MediatorBuilder {
    /// Register a request handler.
    pub fn request_handler<R: Request, H: RequestHandler<R>>(mut self, handler: H) -> Self {
        self.sender = self.sender.handler::<R, H>(handler);
        self
    }

    /// Register an async closure as a request handler.
    pub fn handle_request<R, F, Fut>(mut self, handler: F) -> Self
    where
        R: Request,
        F: Fn(R, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R::Response>> + Send + 'static,
    {
        self.sender = self.sender.handle(handler);
        self
    }

    /// Register a prepared request handler definition.
    pub fn request_definition(mut self, definition: RequestHandlerDefinition) -> Self {
        self.sender = self.sender.definition(definition);
        self
    }

    /// Register a notification handler.
    pub fn notification_handler<N: Notification, H: NotificationHandler<N>>(mut self, handler: H) -> Self {
        self.publisher = self.publisher.handler::<N, H>(handler);
        self
    }

    /// Register an async closure as a notification handler.
    pub fn handle_notification<N, F, Fut>(mut self, handler: F) -> Self
    where
        N: Notification,
        F: Fn(N, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.publisher = self.publisher.handle(handler);
        self
    }

    /// Register a prepared notification handler definition.
    pub fn notification_definition(mut self, definition: NotificationHandlerDefinition) -> Self {
        self.publisher = self.publisher.definition(definition);
        self
    }

    /// Append a request behavior.
    pub fn request_behavior(mut self, behavior: impl RequestBehavior) -> Self {
        self.sender = self.sender.behavior(behavior);
        self
    }

    /// Append a per-handler notification behavior.
    pub fn notification_behavior(mut self, behavior: impl NotificationBehavior) -> Self {
        self.publisher = self.publisher.behavior(behavior);
        self
    }

    /// Append a fan-out behavior.
    pub fn strategy_behavior(mut self, behavior: impl StrategyBehavior) -> Self {
        self.publisher = self.publisher.strategy_behavior(behavior);
        self
    }

    /// Select the publish strategy.
    pub fn strategy(mut self, strategy: impl PublishStrategy) -> Self {
        self.publisher = self.publisher.strategy(strategy);
        self
    }

    /// Apply `settings` to both sides.
    pub fn settings(mut self, settings: &MediatorSettings) -> Self {
        self.sender = self.sender.settings(settings);
        self.publisher = self.publisher.settings(settings);
        self
    }

    /// Build the mediator.
    pub fn build(self) -> Mediator {
        Mediator::new(self.sender.build(), self.publisher.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Concurrent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Deposit(u64);

    impl Request for Deposit {
        type Response = u64;
    }

    #[derive(Debug, Clone)]
    struct Deposited(u64);

    impl Notification for Deposited {}

    #[tokio::test]
    async fn test_send_then_publish() {
        let total = Arc::new(AtomicUsize::new(0));
        let observed = total.clone();
        let mediator = Mediator::builder()
            .handle_request(|req: Deposit, _ctx| async move { Ok(req.0 * 2) })
            .handle_notification(move |n: Deposited, _ctx| {
                let observed = observed.clone();
                async move {
                    observed.fetch_add(n.0 as usize, Ordering::SeqCst);
                    Ok(())
                }
            })
            .strategy(Concurrent)
            .build();

        let doubled = mediator.send(Context::new(), Deposit(21)).await.unwrap();
        mediator
            .clone()
            .publish(Context::new(), Deposited(doubled))
            .await
            .unwrap();

        assert_eq!(doubled, 42);
        assert_eq!(total.load(Ordering::SeqCst), 42);
        assert_eq!(mediator.sender().registry().len(), 1);
        assert_eq!(mediator.publisher().registry().len(), 1);
    }

    struct Vault;

    impl RequestHandler<Deposit> for Vault {
        fn handle(&self, _ctx: Context, request: Deposit) -> crate::BoxFuture<'static, HandlerResult<u64>> {
            Box::pin(async move { Ok(request.0 + 1) })
        }
    }

    impl NotificationHandler<Deposited> for Vault {
        fn handle(&self, _ctx: Context, _n: Deposited) -> crate::BoxFuture<'static, HandlerResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_struct_handlers() {
        let mediator = Mediator::builder()
            .request_handler::<Deposit, _>(Vault)
            .notification_handler::<Deposited, _>(Vault)
            .build();

        assert_eq!(mediator.send(Context::new(), Deposit(9)).await.unwrap(), 10);
        assert!(mediator.publish(Context::new(), Deposited(1)).await.is_ok());

        let reply = mediator
            .send_boxed(Context::new(), Box::new(Deposit(4)))
            .await
            .unwrap();
        assert_eq!(*reply.downcast::<u64>().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_settings_install_recovery() {
        let settings = MediatorSettings {
            recover_panics: true,
            ..Default::default()
        };
        let mediator = Mediator::builder()
            .handle_request(|_: Deposit, _ctx| async move {
                if true {
                    panic!("ledger corrupted");
                }
                Ok(0)
            })
            .settings(&settings)
            .build();

        let err = mediator.send(Context::new(), Deposit(1)).await.unwrap_err();
        assert!(err.is_panic());
    }
}
