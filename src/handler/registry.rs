//! Handler registries for resolving messages by identity.
//!
//! Both registries are built once from a list of definitions and never
//! mutated afterwards, so they can be shared across concurrent dispatches
//! without locking.
//!
//! - [`RequestRegistry`] keeps one handler per request type. When the same
//!   type is registered twice, the last registration wins.
//! - [`NotificationRegistry`] keeps every handler per notification type, in
//!   registration order.
//!
//! # Example
//!
//! ```
//! use mediator::{MessageId, Request, RequestHandlerDefinition, RequestRegistry};
//!
//! #[derive(Debug)]
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = &'static str;
//! }
//!
//! let registry = RequestRegistry::new(vec![RequestHandlerDefinition::from_fn(
//!     |_: Ping, _ctx| async { Ok("pong") },
//! )]);
//!
//! assert!(registry.resolve(MessageId::of::<Ping>()).is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::definition::{HandlerEntry, NotificationHandlerDefinition, RequestHandlerDefinition};
use crate::message::MessageId;

/// Ordered, shared list of handlers resolved for one notification.
pub type HandlerSet = Arc<[HandlerEntry]>;

/// Registry mapping request types to their single handler.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    /// Handlers by request identity.
    handlers: HashMap<MessageId, HandlerEntry>,
}

impl RequestRegistry {
    /// Build the registry from handler definitions.
    pub fn new(definitions: impl IntoIterator<Item = RequestHandlerDefinition>) -> Self {
        let mut handlers = HashMap::new();

        for definition in definitions {
            let entry = definition.into_entry();
            let id = entry.message_id();
            if let Some(previous) = handlers.insert(id, entry) {
                tracing::debug!(
                    request = %id,
                    replaced = previous.name(),
                    "Request handler registered twice, keeping the last one"
                );
            }
        }

        Self { handlers }
    }

    /// Resolve the handler for a request identity.
    pub fn resolve(&self, id: MessageId) -> Option<&HandlerEntry> {
        self.handlers.get(&id)
    }

    /// Check whether a handler is registered for the identity.
    pub fn contains(&self, id: MessageId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Number of registered request types.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Registry mapping notification types to all of their handlers.
#[derive(Debug)]
pub struct NotificationRegistry {
    /// Handlers by notification identity, in registration order.
    handlers: HashMap<MessageId, HandlerSet>,
    /// Returned for identities nobody listens to.
    empty: HandlerSet,
}

impl NotificationRegistry {
    /// Build the registry from handler definitions.
    pub fn new(definitions: impl IntoIterator<Item = NotificationHandlerDefinition>) -> Self {
        let mut grouped: HashMap<MessageId, Vec<HandlerEntry>> = HashMap::new();

        for definition in definitions {
            let entry = definition.into_entry();
            grouped.entry(entry.message_id()).or_default().push(entry);
        }

        let handlers = grouped
            .into_iter()
            .map(|(id, entries)| (id, HandlerSet::from(entries)))
            .collect();

        Self {
            handlers,
            empty: HandlerSet::from(Vec::new()),
        }
    }

    /// Resolve every handler for a notification identity.
    ///
    /// Returns an empty set when nothing is registered.
    pub fn resolve(&self, id: MessageId) -> HandlerSet {
        self.handlers
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.empty.clone())
    }

    /// Check whether at least one handler is registered for the identity.
    pub fn contains(&self, id: MessageId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Number of notification types with at least one handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::handler::{BoxFuture, HandlerResult, NotificationHandler};
    use crate::message::{Notification, Request};

    #[derive(Debug)]
    struct Echo(u32);

    impl Request for Echo {
        type Response = u32;
    }

    #[derive(Debug)]
    struct Other;

    impl Request for Other {
        type Response = ();
    }

    #[derive(Debug, Clone)]
    struct Saved;

    impl Notification for Saved {}

    #[derive(Debug, Clone)]
    struct Deleted;

    impl Notification for Deleted {}

    #[test]
    fn test_resolve_request() {
        let registry = RequestRegistry::new(vec![RequestHandlerDefinition::from_fn(
            |e: Echo, _ctx| async move { Ok(e.0) },
        )]);

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(MessageId::of::<Echo>()));
        assert!(registry.resolve(MessageId::of::<Echo>()).is_some());
    }

    #[test]
    fn test_request_not_found() {
        let registry = RequestRegistry::new(Vec::new());

        assert!(registry.is_empty());
        assert!(registry.resolve(MessageId::of::<Other>()).is_none());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = RequestRegistry::new(vec![
            RequestHandlerDefinition::from_fn(|_: Echo, _ctx| async { Ok(1) }),
            RequestHandlerDefinition::from_fn(|_: Echo, _ctx| async { Ok(2) }),
        ]);

        assert_eq!(registry.len(), 1);
        let handler = registry
            .resolve(MessageId::of::<Echo>())
            .and_then(|e| e.request_handler::<Echo>())
            .unwrap();
        assert_eq!(handler.handle(Context::new(), Echo(0)).await.unwrap(), 2);
    }

    struct AuditLog;

    impl NotificationHandler<Saved> for AuditLog {
        fn handle(&self, _ctx: Context, _n: Saved) -> BoxFuture<'static, HandlerResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    struct SearchIndex;

    impl NotificationHandler<Saved> for SearchIndex {
        fn handle(&self, _ctx: Context, _n: Saved) -> BoxFuture<'static, HandlerResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn test_notification_registration_order() {
        let registry = NotificationRegistry::new(vec![
            NotificationHandlerDefinition::new::<Saved, _>(SearchIndex),
            NotificationHandlerDefinition::from_fn(|_: Deleted, _ctx| async { Ok(()) }),
            NotificationHandlerDefinition::new::<Saved, _>(AuditLog),
        ]);

        let saved = registry.resolve(MessageId::of::<Saved>());
        assert_eq!(saved.len(), 2);
        assert!(saved[0].name().ends_with("SearchIndex"));
        assert!(saved[1].name().ends_with("AuditLog"));
        assert_eq!(registry.resolve(MessageId::of::<Deleted>()).len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_notification_absent_is_empty() {
        let registry = NotificationRegistry::default();

        assert!(registry.is_empty());
        assert!(!registry.contains(MessageId::of::<Saved>()));
        assert!(registry.resolve(MessageId::of::<Saved>()).is_empty());
    }
}
