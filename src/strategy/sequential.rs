//! Sequential, stop-on-first-error strategy.

use super::PublishStrategy;
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, HandlerSet};
use crate::pipeline::Launcher;

/// Runs handlers one at a time, in registration order, on the caller's task.
///
/// The first error stops the fan-out; later handlers are never invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl PublishStrategy for Sequential {
    fn execute(
        &self,
        ctx: Context,
        handlers: HandlerSet,
        launcher: Launcher,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            for handler in handlers.iter() {
                launcher.launch(ctx.clone(), handler.clone()).await?;
            }
            Ok(())
        })
    }
}
