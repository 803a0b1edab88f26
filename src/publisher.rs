//! Notification fan-out.
//!
//! A [`Publisher`] resolves every handler registered for a notification type
//! and hands them to its [`PublishStrategy`]. Notification behaviors wrap each
//! handler call; strategy behaviors wrap the whole fan-out.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::MediatorSettings;
use crate::context::Context;
use crate::error::{MediatorError, Result};
use crate::handler::{
    BoxFuture, HandlerEntry, HandlerResult, NotificationHandler, NotificationHandlerDefinition,
    NotificationRegistry,
};
use crate::message::{MessageId, Notification, SharedNotification};
use crate::pipeline::notification::{wrap_launcher, wrap_strategy};
use crate::pipeline::{Launcher, NotificationBehavior, StrategyBehavior, StrategyNext};
use crate::strategy::{Concurrent, PublishStrategy, Sequential};

/// Everything a [`Publisher`] is built from.
#[derive(Clone)]
pub struct PublisherConfig {
    /// Notification handlers, invoked in registration order by sequential
    /// strategies.
    pub handlers: Vec<NotificationHandlerDefinition>,
    /// Per-handler behaviors, first outermost.
    pub behaviors: Vec<Arc<dyn NotificationBehavior>>,
    /// Whole fan-out behaviors, first outermost.
    pub strategy_behaviors: Vec<Arc<dyn StrategyBehavior>>,
    /// How the handler set is invoked.
    pub strategy: Arc<dyn PublishStrategy>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            behaviors: Vec::new(),
            strategy_behaviors: Vec::new(),
            strategy: Arc::new(Sequential),
        }
    }
}

/// Publishes notifications to all of their handlers.
///
/// Cheap to clone; clones share the registry, behaviors and strategy.
#[derive(Clone)]
pub struct Publisher {
    registry: Arc<NotificationRegistry>,
    behaviors: Arc<[Arc<dyn NotificationBehavior>]>,
    strategy_behaviors: Arc<[Arc<dyn StrategyBehavior>]>,
    strategy: Arc<dyn PublishStrategy>,
}

impl Publisher {
    /// Build a publisher from its configuration.
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            registry: Arc::new(NotificationRegistry::new(config.handlers)),
            behaviors: config.behaviors.into(),
            strategy_behaviors: config.strategy_behaviors.into(),
            strategy: config.strategy,
        }
    }

    /// Start a fluent builder.
    pub fn builder() -> PublisherBuilder {
        PublisherBuilder::new()
    }

    /// The handler registry.
    pub fn registry(&self) -> &NotificationRegistry {
        &self.registry
    }

    /// Deliver `notification` to every registered handler.
    ///
    /// Publishing a notification nobody listens to succeeds without doing
    /// anything.
    pub async fn publish<N: Notification>(&self, ctx: Context, notification: N) -> Result<()> {
        let message = MessageId::of::<N>();
        let handlers = self.registry.resolve(message);
        if handlers.is_empty() {
            tracing::debug!(notification = %message, "No handlers registered, nothing to publish");
            return Ok(());
        }

        let notification = Arc::new(notification);
        let shared: SharedNotification = notification.clone();
        let raw = Launcher::new(move |ctx, entry: HandlerEntry| -> BoxFuture<'static, Result<()>> {
            let handler = entry.notification_handler::<N>().cloned();
            let notification = N::clone(&notification);
            Box::pin(async move {
                let handler = handler.ok_or(MediatorError::HandlerTypeMismatch {
                    message,
                    expected: std::any::type_name::<dyn NotificationHandler<N>>(),
                })?;
                handler
                    .handle(ctx, notification)
                    .await
                    .map_err(MediatorError::Handler)
            })
        });

        if self.behaviors.is_empty() && self.strategy_behaviors.is_empty() {
            return self.strategy.execute(ctx, handlers, raw).await;
        }

        let launcher = wrap_launcher(&self.behaviors, &shared, raw);
        let strategy = self.strategy.clone();
        let fan_out = handlers.clone();
        let run = StrategyNext::new(move |ctx| strategy.execute(ctx, fan_out, launcher));
        wrap_strategy(&self.strategy_behaviors, &shared, &handlers, run)
            .run(ctx)
            .await
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("notification_types", &self.registry.len())
            .field("behaviors", &self.behaviors.len())
            .field("strategy_behaviors", &self.strategy_behaviors.len())
            .finish()
    }
}

/// Fluent builder for [`Publisher`].
#[derive(Default)]
pub struct PublisherBuilder {
    config: PublisherConfig,
}

impl PublisherBuilder {
    /// Create an empty builder using the sequential strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for notification type `N`.
    pub fn handler<N: Notification, H: NotificationHandler<N>>(self, handler: H) -> Self {
        self.definition(NotificationHandlerDefinition::new::<N, H>(handler))
    }

    /// Register an async closure for notification type `N`.
    pub fn handle<N, F, Fut>(self, handler: F) -> Self
    where
        N: Notification,
        F: Fn(N, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.definition(NotificationHandlerDefinition::from_fn(handler))
    }

    /// Register a prepared definition.
    pub fn definition(mut self, definition: NotificationHandlerDefinition) -> Self {
        self.config.handlers.push(definition);
        self
    }

    /// Append a per-handler behavior.
    pub fn behavior(mut self, behavior: impl NotificationBehavior) -> Self {
        self.config.behaviors.push(Arc::new(behavior));
        self
    }

    /// Append a fan-out behavior.
    pub fn strategy_behavior(mut self, behavior: impl StrategyBehavior) -> Self {
        self.config.strategy_behaviors.push(Arc::new(behavior));
        self
    }

    /// Append already shared behaviors of both kinds.
    pub fn behaviors(
        mut self,
        behaviors: impl IntoIterator<Item = Arc<dyn NotificationBehavior>>,
        strategy_behaviors: impl IntoIterator<Item = Arc<dyn StrategyBehavior>>,
    ) -> Self {
        self.config.behaviors.extend(behaviors);
        self.config.strategy_behaviors.extend(strategy_behaviors);
        self
    }

    /// Use `strategy` for every publish.
    pub fn strategy(self, strategy: impl PublishStrategy) -> Self {
        self.shared_strategy(Arc::new(strategy))
    }

    /// Use an already shared strategy.
    pub fn shared_strategy(mut self, strategy: Arc<dyn PublishStrategy>) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Shorthand for the [`Sequential`] strategy.
    pub fn sequential(self) -> Self {
        self.strategy(Sequential)
    }

    /// Shorthand for the [`Concurrent`] strategy.
    pub fn concurrent(self) -> Self {
        self.strategy(Concurrent)
    }

    /// Apply `settings`: its strategy replaces the current one and its
    /// behaviors are appended.
    pub fn settings(self, settings: &MediatorSettings) -> Self {
        self.shared_strategy(settings.strategy.build()).behaviors(
            settings.notification_behaviors(),
            settings.strategy_behaviors(),
        )
    }

    /// Build the publisher.
    pub fn build(self) -> Publisher {
        Publisher::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handler::HandlerSet;
    use crate::strategy::ConcurrentCollectAll;
    use std::any::Any;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct OrderPlaced {
        id: u32,
    }

    impl Notification for OrderPlaced {}

    #[derive(Debug, thiserror::Error)]
    #[error("mailer down")]
    struct MailerDown;

    type Journal = Arc<Mutex<Vec<String>>>;

    fn recorder(journal: &Journal, label: &'static str) -> NotificationHandlerDefinition {
        let journal = journal.clone();
        NotificationHandlerDefinition::from_fn(move |n: OrderPlaced, _ctx| {
            let journal = journal.clone();
            async move {
                journal.lock().unwrap().push(format!("{label}:{}", n.id));
                Ok(())
            }
        })
    }

    fn failing() -> NotificationHandlerDefinition {
        NotificationHandlerDefinition::from_fn(|_: OrderPlaced, _ctx| async {
            Err(BoxError::from(MailerDown))
        })
    }

    #[tokio::test]
    async fn test_publish_without_handlers() {
        let publisher = Publisher::builder().build();
        assert!(publisher
            .publish(Context::new(), OrderPlaced { id: 1 })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_sequential_registration_order() {
        let journal = Journal::default();
        let publisher = Publisher::builder()
            .definition(recorder(&journal, "billing"))
            .definition(recorder(&journal, "shipping"))
            .build();

        publisher
            .publish(Context::new(), OrderPlaced { id: 7 })
            .await
            .unwrap();

        assert_eq!(*journal.lock().unwrap(), vec!["billing:7", "shipping:7"]);
    }

    #[tokio::test]
    async fn test_sequential_stops_at_error() {
        let journal = Journal::default();
        let publisher = Publisher::builder()
            .definition(recorder(&journal, "first"))
            .definition(failing())
            .definition(recorder(&journal, "never"))
            .build();

        let err = publisher
            .publish(Context::new(), OrderPlaced { id: 2 })
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<MailerDown>().is_some());
        assert_eq!(*journal.lock().unwrap(), vec!["first:2"]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_everyone() {
        let journal = Journal::default();
        let publisher = Publisher::builder()
            .definition(recorder(&journal, "a"))
            .definition(failing())
            .definition(recorder(&journal, "b"))
            .concurrent()
            .build();

        let err = publisher
            .publish(Context::new(), OrderPlaced { id: 3 })
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<MailerDown>().is_some());
        let mut seen = journal.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a:3", "b:3"]);
    }

    #[tokio::test]
    async fn test_mismatch_only_affects_that_handler() {
        let journal = Journal::default();
        let bogus: Arc<dyn Any + Send + Sync> = Arc::new(0u8);
        let publisher = Publisher::builder()
            .definition(NotificationHandlerDefinition::from_parts(
                MessageId::of::<OrderPlaced>(),
                bogus,
                "bogus",
            ))
            .definition(recorder(&journal, "ok"))
            .strategy(ConcurrentCollectAll)
            .build();

        let err = publisher
            .publish(Context::new(), OrderPlaced { id: 4 })
            .await
            .unwrap_err();

        assert!(matches!(err, MediatorError::HandlerTypeMismatch { .. }));
        assert_eq!(*journal.lock().unwrap(), vec!["ok:4"]);
    }

    struct Stamp {
        name: &'static str,
        journal: Journal,
    }

    impl NotificationBehavior for Stamp {
        fn handle(
            &self,
            ctx: Context,
            notification: SharedNotification,
            handler: HandlerEntry,
            next: Launcher,
        ) -> BoxFuture<'static, Result<()>> {
            let id = notification.downcast_ref::<OrderPlaced>().map(|n| n.id);
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{:?}", self.name, id));
            next.launch(ctx, handler)
        }
    }

    impl StrategyBehavior for Stamp {
        fn handle(
            &self,
            ctx: Context,
            _notification: SharedNotification,
            handlers: HandlerSet,
            next: StrategyNext,
        ) -> BoxFuture<'static, Result<()>> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, handlers.len()));
            next.run(ctx)
        }
    }

    #[tokio::test]
    async fn test_behaviors_wrap_handlers_and_fan_out() {
        let journal = Journal::default();
        let publisher = Publisher::builder()
            .definition(recorder(&journal, "h1"))
            .definition(recorder(&journal, "h2"))
            .behavior(Stamp {
                name: "each",
                journal: journal.clone(),
            })
            .strategy_behavior(Stamp {
                name: "all",
                journal: journal.clone(),
            })
            .build();

        publisher
            .publish(Context::new(), OrderPlaced { id: 5 })
            .await
            .unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["all:2", "each:Some(5)", "h1:5", "each:Some(5)", "h2:5"]
        );
    }

    type Sightings = Arc<Mutex<Vec<(bool, bool)>>>;

    /// Records whether the context it receives is cancelled and has a deadline.
    fn watcher(sightings: &Sightings) -> NotificationHandlerDefinition {
        let sightings = sightings.clone();
        NotificationHandlerDefinition::from_fn(move |_: OrderPlaced, ctx: Context| {
            let sightings = sightings.clone();
            async move {
                sightings
                    .lock()
                    .unwrap()
                    .push((ctx.is_cancelled(), ctx.deadline().is_some()));
                Ok(())
            }
        })
    }

    fn cancelled_ctx() -> Context {
        let ctx = Context::new().with_timeout(std::time::Duration::from_secs(60));
        ctx.cancel();
        ctx
    }

    #[tokio::test]
    async fn test_sequential_forwards_context() {
        let sightings = Sightings::default();
        let publisher = Publisher::builder()
            .definition(watcher(&sightings))
            .definition(watcher(&sightings))
            .sequential()
            .build();

        publisher
            .publish(cancelled_ctx(), OrderPlaced { id: 8 })
            .await
            .unwrap();

        assert_eq!(*sightings.lock().unwrap(), vec![(true, true), (true, true)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_forwards_context() {
        let sightings = Sightings::default();
        let publisher = Publisher::builder()
            .definition(watcher(&sightings))
            .definition(watcher(&sightings))
            .concurrent()
            .build();

        publisher
            .publish(cancelled_ctx(), OrderPlaced { id: 9 })
            .await
            .unwrap();

        assert_eq!(*sightings.lock().unwrap(), vec![(true, true), (true, true)]);
    }

    #[tokio::test]
    async fn test_behaviors_forward_context() {
        let journal = Journal::default();
        let sightings = Sightings::default();
        let publisher = Publisher::builder()
            .definition(watcher(&sightings))
            .behavior(Stamp {
                name: "each",
                journal: journal.clone(),
            })
            .strategy_behavior(Stamp {
                name: "all",
                journal: journal.clone(),
            })
            .concurrent()
            .build();

        publisher
            .publish(cancelled_ctx(), OrderPlaced { id: 10 })
            .await
            .unwrap();

        assert_eq!(*journal.lock().unwrap(), vec!["all:1", "each:Some(10)"]);
        assert_eq!(*sightings.lock().unwrap(), vec![(true, true)]);
    }

    #[tokio::test]
    async fn test_publish_is_repeatable() {
        let journal = Journal::default();
        let publisher = Publisher::builder()
            .definition(recorder(&journal, "h"))
            .build();

        publisher
            .publish(Context::new(), OrderPlaced { id: 1 })
            .await
            .unwrap();
        publisher
            .clone()
            .publish(Context::new(), OrderPlaced { id: 2 })
            .await
            .unwrap();

        assert_eq!(*journal.lock().unwrap(), vec!["h:1", "h:2"]);
    }
}
