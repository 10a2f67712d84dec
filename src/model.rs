//! The observable model.
//!
//! A [`Model`] owns an [`OptionsStore`] seeded from its kind's [`Defaults`]
//! and a public [`EventRouter`]. At construction it registers one internal
//! listener on the store that republishes every generic change as the keyed
//! event `change:<key>` with the new value as payload. External callers only
//! ever subscribe to the public router, so the internal listener is invisible
//! to them.
//!
//! # Example
//!
//! ```ignore
//! struct Alarm;
//!
//! impl ModelKind for Alarm {
//!     const NAME: &'static str = "alarm";
//!
//!     fn defaults() -> Defaults {
//!         Defaults::from_value(json!({"time": "23:55", "active": false}))
//!     }
//! }
//!
//! let alarm = Model::of_with::<Alarm>(to_options(&json!({"active": true}))?)?;
//! alarm.on_change("active", |value| println!("active is now {}", value));
//! alarm.set("active", false)?;
//! ```

use crate::error::{ModelError, Result};
use crate::events::{EventRouter, WatchConfig, WatchHandle};
use crate::identity::{self, IdGenerator};
use crate::options::{Defaults, OptionsStore};
use crate::types::{change_event_name, to_options, ListenerId, ModelId, Options};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A concrete kind of model and the defaults it declares.
pub trait ModelKind {
    /// Name recorded on every model of this kind.
    const NAME: &'static str;

    /// The default values every instance starts from.
    fn defaults() -> Defaults;
}

/// What to do with keys that the defaults template does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Store them like any other key.
    #[default]
    Accept,
    /// Fail the write with [`ModelError::UnknownKey`].
    Reject,
}

/// Model configuration.
#[derive(Clone)]
pub struct ModelConfig {
    /// Where model ids come from. Default: the process-wide counter.
    pub ids: Arc<dyn IdGenerator>,

    /// Handling of keys outside the defaults template.
    pub unknown_keys: UnknownKeyPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            ids: identity::global(),
            unknown_keys: UnknownKeyPolicy::Accept,
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("next_id", &self.ids.peek())
            .field("unknown_keys", &self.unknown_keys)
            .finish()
    }
}

/// An option bag that publishes a keyed event for every change.
pub struct Model {
    id: ModelId,
    kind: &'static str,
    defaults: Defaults,
    unknown_keys: UnknownKeyPolicy,
    store: OptionsStore,
    output: Arc<EventRouter<Value>>,
}

impl Model {
    /// Create a model holding a copy of `defaults`.
    pub fn new(defaults: Defaults) -> Self {
        let id = identity::global().next_id();
        Self::assemble(id, "model", defaults, UnknownKeyPolicy::Accept, None)
    }

    /// Create a model and apply `overrides` on top of its defaults.
    pub fn with_overrides(defaults: Defaults, overrides: Options) -> Result<Self> {
        Self::with_config(defaults, Some(overrides), ModelConfig::default())
    }

    /// Create a model with explicit configuration.
    ///
    /// The id is taken before anything else, so a rejected construction still
    /// consumes one.
    pub fn with_config(
        defaults: Defaults,
        overrides: Option<Options>,
        config: ModelConfig,
    ) -> Result<Self> {
        Self::build("model", defaults, overrides, config)
    }

    /// Create a model of kind `K` from its declared defaults.
    pub fn of<K: ModelKind>() -> Self {
        let id = identity::global().next_id();
        Self::assemble(id, K::NAME, K::defaults(), UnknownKeyPolicy::Accept, None)
    }

    /// Create a model of kind `K` with overrides applied.
    pub fn of_with<K: ModelKind>(overrides: Options) -> Result<Self> {
        Self::build(K::NAME, K::defaults(), Some(overrides), ModelConfig::default())
    }

    /// Create a model of kind `K` with explicit configuration.
    pub fn of_with_config<K: ModelKind>(
        overrides: Option<Options>,
        config: ModelConfig,
    ) -> Result<Self> {
        Self::build(K::NAME, K::defaults(), overrides, config)
    }

    /// Create a model from text produced by [`serialize`](Self::serialize).
    pub fn from_text(defaults: Defaults, text: &str) -> Result<Self> {
        Self::with_overrides(defaults, deserialize(text)?)
    }

    fn build(
        kind: &'static str,
        defaults: Defaults,
        overrides: Option<Options>,
        config: ModelConfig,
    ) -> Result<Self> {
        let id = config.ids.next_id();

        if let Some(ref overrides) = overrides {
            check_keys(&defaults, config.unknown_keys, overrides.keys().map(String::as_str))?;
        }

        Ok(Self::assemble(id, kind, defaults, config.unknown_keys, overrides))
    }

    fn assemble(
        id: ModelId,
        kind: &'static str,
        defaults: Defaults,
        unknown_keys: UnknownKeyPolicy,
        overrides: Option<Options>,
    ) -> Self {
        let store = OptionsStore::new(&defaults);
        if let Some(overrides) = overrides {
            store.patch(overrides);
        }

        let output: Arc<EventRouter<Value>> = Arc::new(EventRouter::new());

        let router = Arc::clone(&output);
        store.on_change(move |change| {
            let name = change_event_name(&change.key);
            let delivered = router.emit(&name, &change.value);
            trace!(model = %id, event = %name, delivered, "change emitted");
        });

        debug!(model = %id, kind, keys = store.len(), "model created");

        Self {
            id,
            kind,
            defaults,
            unknown_keys,
            store,
            output,
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The template this model was seeded from.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn unknown_keys(&self) -> UnknownKeyPolicy {
        self.unknown_keys
    }

    // --- Reads ---

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    /// Read a key and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.store
            .get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ModelError::Deserialization(e.to_string()))
            })
            .transpose()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// The full current mapping.
    ///
    /// The returned map is an owned copy; changing it does not touch the
    /// model.
    pub fn snapshot(&self) -> Options {
        self.store.value()
    }

    /// The current mapping as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.snapshot())
    }

    /// Deserialize the current mapping into a typed record.
    pub fn record<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| ModelError::Deserialization(e.to_string()))
    }

    // --- Writes ---

    /// Replace the value of `key`.
    ///
    /// If the value changes, `change:<key>` is emitted before this returns.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        check_keys(&self.defaults, self.unknown_keys, std::iter::once(key))?;
        self.store.set(key, value.into());
        Ok(())
    }

    /// Apply a partial mapping; keys it does not mention keep their values.
    ///
    /// With [`UnknownKeyPolicy::Reject`] the whole patch is refused if any
    /// key is undeclared.
    pub fn patch(&self, partial: Options) -> Result<()> {
        check_keys(&self.defaults, self.unknown_keys, partial.keys().map(String::as_str))?;
        self.store.patch(partial);
        Ok(())
    }

    /// Patch from a typed record that serializes to an object.
    pub fn patch_from<T: Serialize>(&self, partial: &T) -> Result<()> {
        self.patch(to_options(partial)?)
    }

    // --- Serialization ---

    /// Compact JSON text of the current mapping. Keys are sorted.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn serialize_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    // --- Events ---

    /// Subscribe to a named event on the public channel.
    pub fn on<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.output.subscribe(event, handler)
    }

    /// Subscribe to changes of one key.
    pub fn on_change<F>(&self, key: &str, handler: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.output.subscribe(change_event_name(key), handler)
    }

    /// Subscribe to every event on the public channel.
    pub fn on_any<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.output.subscribe_any(handler)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.output.unsubscribe(id)
    }

    /// Number of external listeners.
    pub fn listener_count(&self) -> usize {
        self.output.listener_count()
    }

    /// Receive changes through a bounded channel.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        WatchHandle::attach(&self.output, config)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("options", &self.snapshot())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.serialize().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Parse text produced by [`Model::serialize`] back into a mapping.
pub fn deserialize(text: &str) -> Result<Options> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ModelError::Deserialization(format!(
            "expected an object, got {}",
            crate::types::kind_of(&other)
        ))),
        Err(e) => Err(ModelError::Deserialization(e.to_string())),
    }
}

fn check_keys<'a>(
    defaults: &Defaults,
    policy: UnknownKeyPolicy,
    mut keys: impl Iterator<Item = &'a str>,
) -> Result<()> {
    if policy == UnknownKeyPolicy::Accept {
        return Ok(());
    }
    match keys.find(|key| !defaults.contains_key(key)) {
        Some(key) => Err(ModelError::UnknownKey(key.to_string())),
        None => Ok(()),
    }
}
