//! Error types for mediator.

use std::any::Any;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::message::MessageId;

/// Opaque error returned by handler bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raw value a recovered panic was raised with.
///
/// Payloads that are not error values (a `&str`, a `String`, or anything
/// passed to [`std::panic::panic_any`]) are kept here so callers can take
/// them back by type. Error payloads live in the `source` instead.
pub struct PanicPayload(Mutex<Option<Box<dyn Any + Send>>>);

impl PanicPayload {
    fn new(payload: Option<Box<dyn Any + Send>>) -> Self {
        Self(Mutex::new(payload))
    }

    /// Whether a payload is still held and is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|payload| payload.is::<T>())
    }

    /// Take the payload out if it is a `T`; otherwise leave it in place.
    pub fn downcast<T: Any>(&self) -> Option<Box<T>> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.take()?.downcast::<T>() {
            Ok(value) => Some(value),
            Err(payload) => {
                *slot = Some(payload);
                None
            }
        }
    }

    /// Take the payload out whatever its type.
    pub fn take(&self) -> Option<Box<dyn Any + Send>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("PanicPayload").field("held", &held).finish()
    }
}

/// Main error type for all dispatch operations.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// No request handler registered for the message type.
    #[error("no handler registered for request {0}")]
    NoHandlerFound(MessageId),

    /// A resolved handler (or a value travelling through the pipeline) does
    /// not satisfy the contract expected for the message.
    #[error("handler for {message} does not satisfy {expected}")]
    HandlerTypeMismatch {
        /// Message being dispatched.
        message: MessageId,
        /// Contract the dispatcher expected.
        expected: &'static str,
    },

    /// Error returned by a handler body (or a behavior), passed through as-is.
    #[error(transparent)]
    Handler(BoxError),

    /// Panic caught by a recovery boundary.
    #[error("recovered from panic: {message}")]
    Panicked {
        /// Rendered panic payload.
        message: String,
        /// Original payload when it was itself an error value.
        #[source]
        source: Option<BoxError>,
        /// Original payload when it was not.
        payload: PanicPayload,
    },

    /// Every failure of a fan-out, reported by the collect-all strategy.
    #[error("{} notification handlers failed", .0.len())]
    Aggregate(Vec<MediatorError>),

    /// Malformed configuration.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl MediatorError {
    /// Wrap any error value as a handler execution error.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Convert a panic payload into [`MediatorError::Panicked`].
    ///
    /// Error payloads are kept as the source. String payloads become the
    /// message. Everything that is not an error stays reachable through
    /// [`MediatorError::panic_payload`].
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<MediatorError>() {
            Ok(err) => return Self::panicked_with_source(err as BoxError),
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<BoxError>() {
            Ok(err) => return Self::panicked_with_source(*err),
            Err(payload) => payload,
        };
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-error panic payload".to_string()
        };
        Self::Panicked {
            message,
            source: None,
            payload: PanicPayload::new(Some(payload)),
        }
    }

    fn panicked_with_source(err: BoxError) -> Self {
        Self::Panicked {
            message: err.to_string(),
            source: Some(err),
            payload: PanicPayload::new(None),
        }
    }

    /// The raw panic payload, if this error came out of a recovery boundary.
    pub fn panic_payload(&self) -> Option<&PanicPayload> {
        match self {
            Self::Panicked { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Whether this error came out of a recovery boundary.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    /// Borrow the handler error, if this is one.
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Downcast the handler error (or a panicked error source) to a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Handler(err) => err.downcast_ref::<E>(),
            Self::Panicked {
                source: Some(err), ..
            } => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type alias using MediatorError.
pub type Result<T> = std::result::Result<T, MediatorError>;
