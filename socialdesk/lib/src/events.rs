//! Unauthorized-event registry.
//!
//! The request pipeline raises an [`UnauthorizedEvent`] whenever a session is
//! dropped, either because it expired locally or because the server answered
//! `401`. Whoever owns the session lifecycle subscribes here; the registry is
//! constructed at the composition root and handed to the client, so the
//! dependency is visible in the types.
//!
//! Delivery is synchronous and in-process. Each emission reaches every handler
//! registered at that moment exactly once. Nothing is queued, so an emission
//! with no subscribers is lost.
//!
//! ## Examples
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use socialdesk_lib::events::{UnauthorizedEvent, UnauthorizedEvents};
//!
//! let events = UnauthorizedEvents::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let id = events.subscribe(move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! events.emit(&UnauthorizedEvent::rejected(None));
//! events.unsubscribe(id);
//! events.emit(&UnauthorizedEvent::rejected(None));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Why the session was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The stored token reached its expiry before a request was sent.
    Expired,
    /// The server rejected the request with `401`.
    Rejected,
}

/// Detail carried by an unauthorized notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedEvent {
    /// Why the session was dropped.
    pub reason: UnauthorizedReason,
    /// Human-readable message, when one is available.
    pub message: Option<String>,
}

impl UnauthorizedEvent {
    /// Event for a locally expired token.
    pub fn expired() -> Self {
        Self {
            reason: UnauthorizedReason::Expired,
            message: Some("Your session has expired. Please sign in again.".to_string()),
        }
    }

    /// Event for a server `401`, carrying the server's message if any.
    pub fn rejected(message: Option<String>) -> Self {
        Self {
            reason: UnauthorizedReason::Rejected,
            message,
        }
    }
}

/// Handle returned by [`UnauthorizedEvents::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&UnauthorizedEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler)>>,
}

/// Shared registry of unauthorized-event handlers.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct UnauthorizedEvents {
    inner: Arc<Registry>,
}

impl fmt::Debug for UnauthorizedEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnauthorizedEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl UnauthorizedEvents {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` and returns the id that removes it.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&UnauthorizedEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers().push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Delivers `event` to every current handler and returns how many
    /// received it.
    ///
    /// Handlers run after the registry lock is released, so they may
    /// subscribe or unsubscribe.
    pub fn emit(&self, event: &UnauthorizedEvent) -> usize {
        let handlers: Vec<Handler> = self
            .handlers()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        if handlers.is_empty() {
            debug!(reason = ?event.reason, "unauthorized event dropped, no subscribers");
            return 0;
        }

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Returns the number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers().len()
    }

    fn handlers(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Handler)>> {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
