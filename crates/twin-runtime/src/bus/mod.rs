//! Message bus.
//!
//! Every state change the runtime performs is published as an
//! [`EventMessage`]. Subscribers register a [`Subscription`]: a filter
//! plus a handler.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──start()──► Running ──stop()──► Stopped
//!    │                    │                   │
//! publish → NotStarted  publish → delivered  publish → Ok (dropped)
//! ```
//!
//! # Transports
//!
//! [`InternalMessageBus`] delivers in-process. Other transports implement
//! [`MessageBus`].

mod error;
mod internal;

pub use error::MessageBusError;
pub use internal::InternalMessageBus;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use twin_event::{EventKind, EventMessage};
use twin_types::{Reference, SubscriptionId};

/// Event transport.
pub trait MessageBus: Send + Sync {
    /// Starts delivering events.
    ///
    /// # Errors
    ///
    /// Returns [`MessageBusError`] if the transport cannot start.
    fn start(&self) -> Result<(), MessageBusError>;

    /// Stops delivery. Later publishes are silently dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MessageBusError`] if the transport failed to shut down.
    fn stop(&self) -> Result<(), MessageBusError>;

    /// Publishes an event to every matching subscriber.
    ///
    /// # Errors
    ///
    /// - [`MessageBusError::NotStarted`] before [`start`](Self::start)
    /// - [`MessageBusError::Unavailable`] if the transport is down
    fn publish(&self, event: EventMessage) -> Result<(), MessageBusError>;

    /// Registers a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`MessageBusError::Stopped`] after [`stop`](Self::stop).
    fn subscribe(&self, subscription: Subscription) -> Result<SubscriptionId, MessageBusError>;

    /// Removes a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`MessageBusError::UnknownSubscription`] for unknown ids.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), MessageBusError>;
}

/// Decides whether a subscriber receives an event.
pub type EventFilter = Arc<dyn Fn(&EventMessage) -> bool + Send + Sync>;

/// Receives matching events on the subscriber's own worker.
pub type EventHandler = Box<dyn FnMut(EventMessage) + Send>;

/// A filter plus a handler.
///
/// # Example
///
/// ```
/// use twin_event::EventKind;
/// use twin_runtime::bus::Subscription;
///
/// let sub = Subscription::of_kind([EventKind::ValueChange], |event| {
///     println!("{:?}", event.reference());
/// });
/// # drop(sub);
/// ```
pub struct Subscription {
    pub(crate) filter: EventFilter,
    pub(crate) handler: EventHandler,
}

impl Subscription {
    /// Subscription with an arbitrary filter.
    pub fn new(
        filter: impl Fn(&EventMessage) -> bool + Send + Sync + 'static,
        handler: impl FnMut(EventMessage) + Send + 'static,
    ) -> Self {
        Self {
            filter: Arc::new(filter),
            handler: Box::new(handler),
        }
    }

    /// Receives every event.
    pub fn all(handler: impl FnMut(EventMessage) + Send + 'static) -> Self {
        Self::new(|_| true, handler)
    }

    /// Receives events of the given kinds.
    pub fn of_kind(
        kinds: impl IntoIterator<Item = EventKind>,
        handler: impl FnMut(EventMessage) + Send + 'static,
    ) -> Self {
        let kinds: HashSet<EventKind> = kinds.into_iter().collect();
        Self::new(move |event| kinds.contains(&event.kind()), handler)
    }

    /// Receives events about `prefix` or anything below it.
    pub fn with_reference_prefix(
        prefix: Reference,
        handler: impl FnMut(EventMessage) + Send + 'static,
    ) -> Self {
        Self::new(move |event| prefix.is_prefix_of(event.reference()), handler)
    }

    /// Returns `true` if this subscription wants `event`.
    #[must_use]
    pub fn matches(&self, event: &EventMessage) -> bool {
        (self.filter)(event)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
