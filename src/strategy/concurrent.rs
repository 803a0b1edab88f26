//! Concurrent strategies: one tokio task per handler, joined before returning.
//!
//! Every resolved handler is spawned into a [`JoinSet`] and the set is drained
//! to completion. A failing handler never cancels its siblings. Completion
//! order is whatever the runtime produces, so when several handlers fail,
//! which error [`Concurrent`] reports is not determined by registration
//! order.
//!
//! A panic inside one task is contained by the task boundary and reported as
//! [`MediatorError::Panicked`] for that handler.
//!
//! These strategies must run inside a tokio runtime.

use tokio::task::{JoinError, JoinSet};

use super::PublishStrategy;
use crate::context::Context;
use crate::error::{MediatorError, Result};
use crate::handler::{BoxFuture, HandlerSet};
use crate::pipeline::Launcher;

/// Runs all handlers concurrently and returns the first error observed.
///
/// No pooling or throttling: one task per handler per publish.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concurrent;

impl PublishStrategy for Concurrent {
    fn execute(
        &self,
        ctx: Context,
        handlers: HandlerSet,
        launcher: Launcher,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            match run_all(ctx, handlers, launcher).await.into_iter().next() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

/// Runs all handlers concurrently and reports every failure.
///
/// A single failure is returned as-is; several are wrapped in
/// [`MediatorError::Aggregate`], in completion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentCollectAll;

impl PublishStrategy for ConcurrentCollectAll {
    fn execute(
        &self,
        ctx: Context,
        handlers: HandlerSet,
        launcher: Launcher,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            let mut errors = run_all(ctx, handlers, launcher).await;
            match errors.len() {
                0 => Ok(()),
                1 => Err(errors.remove(0)),
                _ => Err(MediatorError::Aggregate(errors)),
            }
        })
    }
}

/// Spawn every handler, wait for all of them, and return the failures in
/// completion order.
async fn run_all(ctx: Context, handlers: HandlerSet, launcher: Launcher) -> Vec<MediatorError> {
    let mut tasks = JoinSet::new();

    for handler in handlers.iter() {
        let ctx = ctx.clone();
        let handler = handler.clone();
        let launcher = launcher.clone();
        tasks.spawn(async move { launcher.launch(ctx, handler).await });
    }

    let mut errors = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.unwrap_or_else(|e| Err(from_join_error(e)));
        if let Err(err) = outcome {
            errors.push(err);
        }
    }
    errors
}

fn from_join_error(err: JoinError) -> MediatorError {
    if err.is_panic() {
        let err = MediatorError::from_panic(err.into_panic());
        tracing::error!(error = %err, "Notification handler task panicked");
        err
    } else {
        MediatorError::handler(err)
    }
}
