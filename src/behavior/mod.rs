//! Standard behaviors shipped with the crate.
//!
//! - [`RecoverRequestBehavior`] / [`RecoverStrategyBehavior`] turn panics into
//!   [`MediatorError::Panicked`](crate::MediatorError::Panicked).
//! - [`LogRequestBehavior`], [`LogNotificationBehavior`] and
//!   [`LogStrategyBehavior`] time the wrapped call and report it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mediator::{LogRequestBehavior, RecoverRequestBehavior, RequestBehavior};
//!
//! let behaviors: Vec<Arc<dyn RequestBehavior>> = vec![
//!     Arc::new(LogRequestBehavior::tracing()),
//!     Arc::new(RecoverRequestBehavior),
//! ];
//! assert_eq!(behaviors.len(), 2);
//! ```

mod log;
mod recover;

pub use log::{
    LogNotificationBehavior, LogRequestBehavior, LogStrategyBehavior, NotificationLogRecord,
    RequestLogRecord, StrategyLogRecord,
};
pub use recover::{RecoverRequestBehavior, RecoverStrategyBehavior};
