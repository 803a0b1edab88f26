//! Handler module - handler contracts and registries.
//!
//! Provides:
//! - [`RequestHandler`] / [`NotificationHandler`] - the contracts handlers implement
//! - [`RequestHandlerDefinition`] / [`NotificationHandlerDefinition`] - a handler plus its message type
//! - [`RequestRegistry`] / [`NotificationRegistry`] - immutable identity-to-handler maps
//!
//! # Example
//!
//! ```
//! use mediator::{Notification, NotificationHandlerDefinition, NotificationRegistry, MessageId};
//!
//! #[derive(Debug, Clone)]
//! struct UserJoined(String);
//!
//! impl Notification for UserJoined {}
//!
//! let registry = NotificationRegistry::new(vec![
//!     NotificationHandlerDefinition::from_fn(|n: UserJoined, _ctx| async move {
//!         println!("welcome {}", n.0);
//!         Ok(())
//!     }),
//!     NotificationHandlerDefinition::from_fn(|_: UserJoined, _ctx| async { Ok(()) }),
//! ]);
//!
//! assert_eq!(registry.resolve(MessageId::of::<UserJoined>()).len(), 2);
//! ```

mod definition;
mod registry;

pub use definition::{
    BoxFuture, FnNotificationHandler, FnRequestHandler, HandlerEntry, HandlerResult,
    NotificationHandler, NotificationHandlerDefinition, RequestHandler, RequestHandlerDefinition,
};
pub use registry::{HandlerSet, NotificationRegistry, RequestRegistry};
