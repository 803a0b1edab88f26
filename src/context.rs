//! Dispatch context for handlers and behaviors.
//!
//! A [`Context`] is created by the caller of `send`/`publish` and forwarded
//! unchanged into every behavior and handler call. It carries a
//! [`CancellationToken`] and an optional deadline. The dispatch core never
//! enforces either; handlers decide how to react, typically by racing their
//! work against [`Context::cancelled`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use mediator::Context;
//!
//! let ctx = Context::new().with_timeout(Duration::from_secs(5));
//! let child = ctx.clone();
//!
//! ctx.cancel();
//! assert!(child.is_cancelled());
//! assert!(!child.is_expired());
//! ```

use std::time::{Duration, Instant};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Context passed to handlers and pipeline behaviors.
///
/// # Thread Safety
///
/// `Context` is `Clone` and can be shared across tasks. Clones share the same
/// cancellation token.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Cancellation shared by every clone.
    token: CancellationToken,
    /// Deadline set by the caller, if any.
    deadline: Option<Instant>,
}

impl Context {
    /// Create a context with no deadline that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context driven by an existing token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Return a context sharing this one's token, with a deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            token: self.token.clone(),
            deadline: Some(deadline),
        }
    }

    /// Return a context whose deadline is `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Return a child context. Cancelling the parent cancels the child, but
    /// cancelling the child leaves the parent untouched.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// The underlying token.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Get the deadline.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when no deadline is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// Signal cancellation. All clones and children observe it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Whether the caller asked handlers to stop, by cancellation or deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }
}
