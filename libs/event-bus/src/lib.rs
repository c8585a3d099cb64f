#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Synchronous publish/subscribe hub.
//!
//! Listeners are matched by the concrete type of the published event and run
//! on the publisher's thread, in registration order. A listener that returns
//! an error or panics is logged and skipped; the publisher and the remaining
//! listeners are unaffected.
//!
//! ```ignore
//! let bus = EventBus::new();
//! let id = bus.subscribe(|e: &SessionEvent| {
//!     tracing::info!(?e, "session event");
//!     Ok(())
//! });
//! bus.publish(&SessionEvent::Started { .. });
//! bus.unregister(id);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

/// A subscriber to the bus.
pub trait EventListener: Send + Sync {
    /// Whether this listener handles `event`.
    fn accepts(&self, event: &dyn Any) -> bool;

    /// Handle an accepted event.
    ///
    /// # Errors
    ///
    /// Errors are logged by the bus and never reach the publisher.
    fn on_event(&self, event: &dyn Any) -> anyhow::Result<()>;
}

/// Adapts a closure over one event type into an [`EventListener`].
pub struct TypedListener<E, F> {
    handler: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> TypedListener<E, F>
where
    E: Any,
    F: Fn(&E) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

impl<E, F> EventListener for TypedListener<E, F>
where
    E: Any,
    F: Fn(&E) -> anyhow::Result<()> + Send + Sync,
{
    fn accepts(&self, event: &dyn Any) -> bool {
        event.is::<E>()
    }

    fn on_event(&self, event: &dyn Any) -> anyhow::Result<()> {
        match event.downcast_ref::<E>() {
            Some(e) => (self.handler)(e),
            None => Ok(()),
        }
    }
}

/// Handle returned by registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    listener: Arc<dyn EventListener>,
}

/// Synchronous event hub. Registration is copy-on-write, so publishing never
/// blocks on concurrent register/unregister calls.
pub struct EventBus {
    subscribers: ArcSwap<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener. Registering the same `Arc` twice returns the
    /// original subscription.
    pub fn register(&self, listener: Arc<dyn EventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let previous = self.subscribers.rcu(|current| {
            let mut next = Vec::clone(current);
            if !next.iter().any(|s| Arc::ptr_eq(&s.listener, &listener)) {
                next.push(Subscriber {
                    id,
                    listener: Arc::clone(&listener),
                });
            }
            next
        });
        if let Some(existing) = previous
            .iter()
            .find(|s| Arc::ptr_eq(&s.listener, &listener))
        {
            tracing::debug!(subscription = %existing.id, "Listener already registered");
            return existing.id;
        }
        tracing::trace!(subscription = %id, "Listener registered");
        id
    }

    /// Register a closure for events of type `E`.
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: Any,
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(Arc::new(TypedListener::new(handler)))
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let previous = self.subscribers.rcu(|current| {
            current
                .iter()
                .filter(|s| s.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|s| s.id == id)
    }

    /// Deliver `event` to every accepting listener. Returns how many handled it
    /// successfully.
    pub fn publish<E: Any>(&self, event: &E) -> usize {
        let snapshot = self.subscribers.load_full();
        let event: &dyn Any = event;
        let mut delivered = 0;

        for sub in snapshot.iter() {
            if !sub.listener.accepts(event) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| sub.listener.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    tracing::warn!(
                        subscription = %sub.id,
                        event_type = type_name::<E>(),
                        error = %err,
                        "Event listener failed; listeners should handle their own errors"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        subscription = %sub.id,
                        event_type = type_name::<E>(),
                        "Event listener panicked"
                    );
                }
            }
        }
        delivered
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
