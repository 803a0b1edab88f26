//! Publish strategies - how a notification's handler set is invoked.
//!
//! - [`Sequential`] runs handlers one after another in registration order and
//!   stops at the first error. This is the default.
//! - [`Concurrent`] runs every handler as its own tokio task, waits for all of
//!   them, and returns the first error in completion order.
//! - [`ConcurrentCollectAll`] schedules like [`Concurrent`] but reports every
//!   failure.
//!
//! Custom strategies implement [`PublishStrategy`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mediator::{Context, HandlerSet, Launcher, PublishStrategy, Sequential};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let handlers: HandlerSet = Vec::new().into();
//! let launcher = Launcher::new(|_ctx, _handler| Box::pin(async { Ok(()) }));
//!
//! let result = Sequential.execute(Context::new(), handlers, launcher).await;
//! assert!(result.is_ok());
//! # }
//! ```

mod concurrent;
mod sequential;

pub use concurrent::{Concurrent, ConcurrentCollectAll};
pub use sequential::Sequential;

use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, HandlerSet};
use crate::pipeline::Launcher;

/// Policy deciding how the resolved handlers of one notification are invoked.
///
/// Strategies are stateless: they receive the ordered handler set and a
/// launcher that runs one handler through the notification pipeline, and
/// return a single aggregated result.
pub trait PublishStrategy: Send + Sync + 'static {
    /// Invoke the handlers.
    fn execute(
        &self,
        ctx: Context,
        handlers: HandlerSet,
        launcher: Launcher,
    ) -> BoxFuture<'static, Result<()>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fan-out fixtures shared by the strategy tests.

    use std::sync::{Arc, Mutex};

    use crate::context::Context;
    use crate::error::MediatorError;
    use crate::handler::{HandlerResult, HandlerSet, NotificationHandlerDefinition};
    use crate::message::Notification;
    use crate::pipeline::Launcher;

    #[derive(Debug, Clone)]
    pub struct Sample;

    impl Notification for Sample {}

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("step {0} failed")]
    pub struct StepFailed(pub usize);

    /// Build `n` handlers that record their index when run and fail when
    /// their index is listed in `failing`, plus a launcher invoking them.
    pub fn fan_out(n: usize, failing: &[usize]) -> (HandlerSet, Launcher, Arc<Mutex<Vec<usize>>>) {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let set: HandlerSet = (0..n)
            .map(|index| {
                let executed = executed.clone();
                let fails = failing.contains(&index);
                NotificationHandlerDefinition::from_fn(move |_: Sample, _ctx| {
                    let executed = executed.clone();
                    async move {
                        executed.lock().unwrap().push(index);
                        let outcome: HandlerResult<()> = if fails {
                            Err(StepFailed(index).into())
                        } else {
                            Ok(())
                        };
                        outcome
                    }
                })
                .into_entry()
            })
            .collect::<Vec<_>>()
            .into();

        let launcher = Launcher::new(|ctx: Context, handler| {
            Box::pin(async move {
                let typed = handler.notification_handler::<Sample>().cloned();
                match typed {
                    Some(h) => h.handle(ctx, Sample).await.map_err(MediatorError::Handler),
                    None => Err(MediatorError::handler("not a Sample handler")),
                }
            })
        });

        (set, launcher, executed)
    }
}
