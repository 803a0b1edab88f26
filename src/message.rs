//! Message identities and contracts.
//!
//! A message is identified by its Rust type. [`MessageId`] captures that
//! identity as a registry key, and the erased views ([`BoxedRequest`],
//! [`SharedNotification`], [`AnyResponse`]) let pipeline behaviors operate on
//! any message without knowing its concrete type.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Stable identity of a message type, used as the registry key.
#[derive(Clone, Copy)]
pub struct MessageId {
    id: TypeId,
    name: &'static str,
}

impl MessageId {
    /// Identity of the message type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, for diagnostics only.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageId {}

impl Hash for MessageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A message expecting exactly one handler and one typed response.
pub trait Request: fmt::Debug + Send + 'static {
    /// Response produced by the handler.
    type Response: Send + 'static;
}

/// A message broadcast to zero or more handlers.
///
/// Each handler receives its own clone.
pub trait Notification: Clone + fmt::Debug + Send + Sync + 'static {}

/// Object-safe view over any request, used at the behavior seam.
pub trait ErasedRequest: Any + fmt::Debug + Send {
    /// Identity of the concrete request type.
    fn message_id(&self) -> MessageId;
    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Recover the owned box as `Any`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<R: Request> ErasedRequest for R {
    fn message_id(&self) -> MessageId {
        MessageId::of::<R>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Owned, type-erased request travelling down the request pipeline.
///
/// Behaviors may inspect or mutate it before handing it to the next step.
pub type BoxedRequest = Box<dyn ErasedRequest>;

impl dyn ErasedRequest {
    /// Borrow the request as `R`, if it is one.
    pub fn downcast_ref<R: Request>(&self) -> Option<&R> {
        self.as_any().downcast_ref::<R>()
    }

    /// Mutably borrow the request as `R`, if it is one.
    pub fn downcast_mut<R: Request>(&mut self) -> Option<&mut R> {
        self.as_any_mut().downcast_mut::<R>()
    }
}

/// Object-safe view over any notification.
pub trait ErasedNotification: Any + fmt::Debug + Send + Sync {
    /// Identity of the concrete notification type.
    fn message_id(&self) -> MessageId;
    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<N: Notification> ErasedNotification for N {
    fn message_id(&self) -> MessageId {
        MessageId::of::<N>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn ErasedNotification {
    /// Borrow the notification as `N`, if it is one.
    pub fn downcast_ref<N: Notification>(&self) -> Option<&N> {
        self.as_any().downcast_ref::<N>()
    }
}

/// Read-only notification shared by every handler of a fan-out.
pub type SharedNotification = Arc<dyn ErasedNotification>;

/// Type-erased response travelling back up the request pipeline.
pub type AnyResponse = Box<dyn Any + Send>;
