//! Core types for models and their change events.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The dynamic option bag held by every model.
///
/// Keys are kept sorted, so two equal bags always serialize to the same text.
pub type Options = serde_json::Map<String, Value>;

/// Name of the generic change notification raised by an options store.
pub const CHANGE_EVENT: &str = "change";

/// Prefix of the keyed events a model publishes.
pub const CHANGE_PREFIX: &str = "change:";

/// Unique identifier for a model instance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelId(pub u64);

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for a registered event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A single key mutation inside an options store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub key: String,
    pub value: Value,
}

impl ChangeEvent {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// The keyed event name this change is published under.
    pub fn event_name(&self) -> String {
        change_event_name(&self.key)
    }
}

/// Build the keyed event name for `key`, e.g. `change:time`.
pub fn change_event_name(key: &str) -> String {
    let mut name = String::with_capacity(CHANGE_PREFIX.len() + key.len());
    name.push_str(CHANGE_PREFIX);
    name.push_str(key);
    name
}

/// Recover the option key from a keyed event name.
pub fn changed_key(event_name: &str) -> Option<&str> {
    event_name.strip_prefix(CHANGE_PREFIX)
}

/// Convert a typed record into an option bag.
///
/// Fails with [`ModelError::InvalidPatch`] if the record does not serialize
/// to a JSON object.
pub fn to_options<T: Serialize>(record: &T) -> Result<Options> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::InvalidPatch(format!(
            "expected an object, got {}",
            kind_of(&other)
        ))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_event_name() {
        assert_eq!(change_event_name("time"), "change:time");
        assert_eq!(change_event_name(""), "change:");

        let event = ChangeEvent::new("active", json!(true));
        assert_eq!(event.event_name(), "change:active");
    }

    #[test]
    fn test_changed_key() {
        assert_eq!(changed_key("change:time"), Some("time"));
        assert_eq!(changed_key("change:"), Some(""));
        assert_eq!(changed_key("change"), None);
        assert_eq!(changed_key("update:time"), None);
    }

    #[test]
    fn test_to_options_struct() {
        #[derive(Serialize)]
        struct Alarm {
            name: String,
            active: bool,
        }

        let options = to_options(&Alarm {
            name: "Home".into(),
            active: false,
        })
        .unwrap();

        assert_eq!(options.get("name"), Some(&json!("Home")));
        assert_eq!(options.get("active"), Some(&json!(false)));
    }

    #[test]
    fn test_to_options_rejects_scalars() {
        let result = to_options(&42);
        assert!(matches!(result, Err(ModelError::InvalidPatch(_))));
    }

    #[test]
    fn test_model_id_ordering() {
        let id = ModelId(5);
        assert!(ModelId(1) < ModelId(2));
        assert_eq!(id.to_string(), "5");
    }
}
