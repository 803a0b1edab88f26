//! Pipeline module - behavior composition around handler calls.
//!
//! Three kinds of interceptors exist:
//!
//! - [`RequestBehavior`] wraps a whole request dispatch.
//! - [`NotificationBehavior`] wraps each individual notification handler call.
//! - [`StrategyBehavior`] wraps a whole notification fan-out.
//!
//! All chains are built with [`compose`]: the first configured behavior is
//! the outermost one. For behaviors `[A, B]` the call order is
//! `A -> B -> handler -> B -> A`.
//!
//! ```text
//!   A ──► B ──► handler
//!   A ◄── B ◄───┘
//! ```

pub mod notification;
pub mod request;

pub use notification::{Launcher, NotificationBehavior, StrategyBehavior, StrategyNext};
pub use request::{Failure, Next, Reply, RequestBehavior};

/// Wrap `seed` with every behavior so that `behaviors[0]` ends up outermost.
///
/// `wrap(next, behavior)` must return a continuation that runs `behavior`
/// around `next`. The fold walks the list back to front, so the last
/// behavior wraps the seed first and the first behavior wraps everything.
pub fn compose<B, F>(behaviors: &[B], seed: F, mut wrap: impl FnMut(F, &B) -> F) -> F {
    behaviors
        .iter()
        .rev()
        .fold(seed, |next, behavior| wrap(next, behavior))
}
