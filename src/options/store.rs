//! Live option storage with generic change notifications.

use super::defaults::Defaults;
use super::merge::{apply_entry, apply_set};
use crate::events::EventRouter;
use crate::types::{ChangeEvent, ListenerId, Options, CHANGE_EVENT};
use parking_lot::RwLock;
use serde_json::Value;

/// Holds the current option values of one model.
///
/// Every write that changes a key raises exactly one [`CHANGE_EVENT`]
/// notification carrying `{ key, value }`. Notifications are delivered after
/// the value lock is released, so listeners may read or write the store.
pub struct OptionsStore {
    values: RwLock<Options>,
    events: EventRouter<ChangeEvent>,
}

impl OptionsStore {
    /// Create a store seeded from a copy of `defaults`.
    pub fn new(defaults: &Defaults) -> Self {
        Self::from_options(defaults.instantiate())
    }

    pub fn from_options(values: Options) -> Self {
        Self {
            values: RwLock::new(values),
            events: EventRouter::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Copy of the full current mapping.
    pub fn value(&self) -> Options {
        self.values.read().clone()
    }

    /// Current keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Replace the value of `key`. Returns true if it changed.
    pub fn set(&self, key: &str, value: Value) -> bool {
        let change = apply_set(&mut self.values.write(), key, value);
        match change {
            Some(change) => {
                self.notify(&change);
                true
            }
            None => false,
        }
    }

    /// Apply a partial mapping. Returns the number of keys that changed.
    ///
    /// Keys are written one at a time and each change is announced before
    /// the next key is written, so a listener that writes to a later key is
    /// overwritten by the patch, and the last notice for every key matches
    /// the stored value.
    pub fn patch(&self, partial: Options) -> usize {
        let mut changed = 0;
        for (key, value) in partial {
            let change = apply_entry(&mut self.values.write(), key, value);
            if let Some(change) = change {
                self.notify(&change);
                changed += 1;
            }
        }
        changed
    }

    /// Register a handler for the generic change notification.
    pub fn on_change<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(CHANGE_EVENT, handler)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    fn notify(&self, change: &ChangeEvent) {
        self.events.emit(CHANGE_EVENT, change);
    }
}

impl std::fmt::Debug for OptionsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsStore")
            .field("values", &*self.values.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
