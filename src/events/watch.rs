//! Channel-backed watchers for keyed change events.

use super::router::EventRouter;
use crate::types::{changed_key, ChangeEvent, ListenerId};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

/// Configuration for a watcher.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Max buffered changes before the watcher is cut off.
    /// Default: 1000
    pub buffer_size: usize,

    /// Only forward changes to these keys (None = all keys).
    pub keys: Option<Vec<String>>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            keys: None,
        }
    }
}

impl WatchConfig {
    /// Watch every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// Watch specific keys.
    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            keys: Some(keys),
            ..Default::default()
        }
    }
}

/// Sending half of a watcher, owned by the router listener.
struct WatchSink {
    sender: Sender<ChangeEvent>,
    keys: Option<Vec<String>>,
    overflowed: Arc<AtomicBool>,
}

impl WatchSink {
    fn wants(&self, key: &str) -> bool {
        match &self.keys {
            Some(keys) => keys.iter().any(|k| k == key),
            None => true,
        }
    }

    fn deliver(&self, event_name: &str, value: &Value) {
        if self.overflowed.load(Ordering::Acquire) {
            return;
        }
        let Some(key) = changed_key(event_name) else {
            return;
        };
        if !self.wants(key) {
            return;
        }

        match self.sender.try_send(ChangeEvent::new(key, value.clone())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(key, "watcher buffer full, dropping watcher");
                self.overflowed.store(true, Ordering::Release);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.overflowed.store(true, Ordering::Release);
            }
        }
    }
}

/// Handle to a watcher.
///
/// Dropping the handle detaches the watcher from its router.
pub struct WatchHandle {
    pub id: ListenerId,
    /// Channel to receive changes.
    pub receiver: Receiver<ChangeEvent>,
    overflowed: Arc<AtomicBool>,
    router: Weak<EventRouter<Value>>,
}

impl WatchHandle {
    /// Attach a new watcher to `router`.
    pub(crate) fn attach(router: &Arc<EventRouter<Value>>, config: WatchConfig) -> Self {
        let (sender, receiver) = bounded(config.buffer_size);
        let overflowed = Arc::new(AtomicBool::new(false));

        let sink = WatchSink {
            sender,
            keys: config.keys,
            overflowed: Arc::clone(&overflowed),
        };
        let id = router.subscribe_any(move |name, value| sink.deliver(name, value));

        Self {
            id,
            receiver,
            overflowed,
            router: Arc::downgrade(router),
        }
    }

    /// Receive the next change (blocking).
    pub fn recv(&self) -> Result<ChangeEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a change (non-blocking).
    pub fn try_recv(&self) -> Result<ChangeEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ChangeEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every change currently buffered.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }

    /// True once the buffer overflowed; no further changes are delivered.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(router) = self.router.upgrade() {
            router.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.id)
            .field("pending", &self.receiver.len())
            .field("overflowed", &self.is_overflowed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_watch_all_keys() {
        let router = Arc::new(EventRouter::new());
        let handle = WatchHandle::attach(&router, WatchConfig::all());

        router.emit("change:a", &json!(1));
        router.emit("change:b", &json!("x"));

        assert_eq!(
            handle.drain(),
            vec![
                ChangeEvent::new("a", json!(1)),
                ChangeEvent::new("b", json!("x")),
            ]
        );
    }

    #[test]
    fn test_watch_filters_keys() {
        let router = Arc::new(EventRouter::new());
        let handle = WatchHandle::attach(&router, WatchConfig::keys(vec!["b".to_string()]));

        router.emit("change:a", &json!(1));
        router.emit("change:b", &json!(2));

        assert_eq!(handle.drain(), vec![ChangeEvent::new("b", json!(2))]);
    }

    #[test]
    fn test_ignores_non_change_events() {
        let router = Arc::new(EventRouter::new());
        let handle = WatchHandle::attach(&router, WatchConfig::all());

        router.emit("other", &json!(1));
        assert!(handle.try_recv().is_err());
    }

    #[test]
    fn test_overflow_cuts_off_watcher() {
        let router = Arc::new(EventRouter::new());
        let config = WatchConfig {
            buffer_size: 2,
            ..Default::default()
        };
        let handle = WatchHandle::attach(&router, config);

        for i in 0..5 {
            router.emit("change:n", &json!(i));
        }

        assert!(handle.is_overflowed());
        assert_eq!(handle.drain().len(), 2);

        router.emit("change:n", &json!(99));
        assert!(handle.try_recv().is_err());
    }

    #[test]
    fn test_drop_detaches() {
        let router = Arc::new(EventRouter::new());
        let handle = WatchHandle::attach(&router, WatchConfig::all());
        assert_eq!(router.listener_count(), 1);

        drop(handle);
        assert_eq!(router.listener_count(), 0);
    }
}
