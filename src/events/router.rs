//! Named-event router with synchronous delivery.

use crate::types::ListenerId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handler for a single named event.
pub type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handler that sees every event together with its name.
pub type AnyHandler<P> = Arc<dyn Fn(&str, &P) + Send + Sync>;

/// Where a listener is attached.
enum Route<P> {
    Named { event: String, handler: Handler<P> },
    Any(AnyHandler<P>),
}

/// Internal listener state.
struct Listener<P> {
    id: ListenerId,
    route: Route<P>,
}

impl<P> Listener<P> {
    fn matches(&self, name: &str) -> bool {
        match &self.route {
            Route::Named { event, .. } => event == name,
            Route::Any(_) => true,
        }
    }
}

/// A handler resolved for one emission.
enum Resolved<P> {
    Named(Handler<P>),
    Any(AnyHandler<P>),
}

/// Publish/subscribe router keyed by event name.
///
/// Handlers run on the emitting thread, in registration order, before
/// [`emit`](Self::emit) returns. The listener table is not locked while
/// handlers run, so a handler may subscribe, unsubscribe or emit again.
pub struct EventRouter<P> {
    /// Active listeners in registration order.
    listeners: RwLock<Vec<Listener<P>>>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
}

impl<P> EventRouter<P> {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handler` for events named `event`.
    pub fn subscribe<F>(&self, event: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.insert(Route::Named {
            event: event.into(),
            handler: Arc::new(handler),
        })
    }

    /// Register `handler` for every event emitted on this router.
    pub fn subscribe_any<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&str, &P) + Send + Sync + 'static,
    {
        self.insert(Route::Any(Arc::new(handler)))
    }

    fn insert(&self, route: Route<P>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push(Listener { id, route });
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Deliver `payload` to every listener of `event`.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &str, payload: &P) -> usize {
        let handlers: Vec<Resolved<P>> = {
            let listeners = self.listeners.read();
            listeners
                .iter()
                .filter(|l| l.matches(event))
                .map(|l| match &l.route {
                    Route::Named { handler, .. } => Resolved::Named(Arc::clone(handler)),
                    Route::Any(handler) => Resolved::Any(Arc::clone(handler)),
                })
                .collect()
        };

        for handler in &handlers {
            match handler {
                Resolved::Named(h) => h(payload),
                Resolved::Any(h) => h(event, payload),
            }
        }

        handlers.len()
    }

    /// Total number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Number of listeners an emission of `event` would reach.
    pub fn listener_count_for(&self, event: &str) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|l| l.matches(event))
            .count()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

impl<P> Default for EventRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for EventRouter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
