//! # mediator
//!
//! In-process mediator for Rust services: typed request dispatch to a single
//! handler and notification fan-out to many, both routed through composable
//! pipeline behaviors.
//!
//! ## Architecture
//!
//! - **Requests** ([`Sender`]): one handler per request type, wrapped by
//!   [`RequestBehavior`]s, run once on the caller's task
//! - **Notifications** ([`Publisher`]): zero or more handlers per type,
//!   invoked by a [`PublishStrategy`] and wrapped by
//!   [`NotificationBehavior`]s (per handler) and [`StrategyBehavior`]s
//!   (per fan-out)
//!
//! Registries are built once and never change afterwards, so a mediator can
//! be cloned and shared freely.
//!
//! ## Example
//!
//! ```
//! use mediator::{Context, Mediator, Notification, RecoverRequestBehavior, Request};
//!
//! #[derive(Debug)]
//! struct CreateUser { name: String }
//!
//! impl Request for CreateUser {
//!     type Response = u64;
//! }
//!
//! #[derive(Debug, Clone)]
//! struct UserCreated { id: u64 }
//!
//! impl Notification for UserCreated {}
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> mediator::Result<()> {
//! let mediator = Mediator::builder()
//!     .handle_request(|req: CreateUser, _ctx| async move { Ok(req.name.len() as u64) })
//!     .handle_notification(|event: UserCreated, _ctx| async move {
//!         println!("welcome user {}", event.id);
//!         Ok(())
//!     })
//!     .request_behavior(RecoverRequestBehavior)
//!     .build();
//!
//! let id = mediator.send(Context::new(), CreateUser { name: "ada".into() }).await?;
//! mediator.publish(Context::new(), UserCreated { id }).await?;
//! # Ok(())
//! # }
//! ```

pub mod behavior;
pub mod config;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod strategy;

mod context;
mod mediator;
mod message;
mod publisher;
mod sender;

pub use behavior::{
    LogNotificationBehavior, LogRequestBehavior, LogStrategyBehavior, NotificationLogRecord,
    RecoverRequestBehavior, RecoverStrategyBehavior, RequestLogRecord, StrategyLogRecord,
};
pub use config::{MediatorSettings, StrategyKind};
pub use context::Context;
pub use error::{BoxError, MediatorError, PanicPayload, Result};
pub use handler::{
    BoxFuture, HandlerEntry, HandlerResult, HandlerSet, NotificationHandler,
    NotificationHandlerDefinition, NotificationRegistry, RequestHandler, RequestHandlerDefinition,
    RequestRegistry,
};
pub use mediator::{Mediator, MediatorBuilder};
pub use message::{
    AnyResponse, BoxedRequest, ErasedNotification, ErasedRequest, MessageId, Notification,
    Request, SharedNotification,
};
pub use pipeline::{
    Failure, Launcher, Next, NotificationBehavior, Reply, RequestBehavior, StrategyBehavior,
    StrategyNext,
};
pub use publisher::{Publisher, PublisherBuilder, PublisherConfig};
pub use sender::{PartialFailure, Sender, SenderBuilder, SenderConfig};
pub use strategy::{Concurrent, ConcurrentCollectAll, PublishStrategy, Sequential};
