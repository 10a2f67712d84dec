//! Immutable default templates.

use crate::error::Result;
use crate::types::{kind_of, to_options, Options};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// The default option values declared by a model kind.
///
/// A template is shared, never mutated, and cheap to clone. Every model
/// seeds its own store from [`instantiate`](Self::instantiate), which deep
/// copies the template, so nested mappings and sequences are never shared
/// between instances.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Defaults {
    template: Arc<Options>,
}

impl Defaults {
    pub fn new(options: Options) -> Self {
        Self {
            template: Arc::new(options),
        }
    }

    /// A template with no keys.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a template from a JSON value. Anything but an object yields an
    /// empty template.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            Value::Null => Self::empty(),
            other => {
                warn!(kind = kind_of(&other), "defaults are not an object, using none");
                Self::empty()
            }
        }
    }

    /// Parse a template from JSON text. Malformed text yields an empty
    /// template.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                warn!(error = %e, "malformed defaults, using none");
                Self::empty()
            }
        }
    }

    /// Build a template from a typed record, e.g. `Alarm::default()`.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self> {
        Ok(Self::new(to_options(record)?))
    }

    /// A fresh, deep copy of the template.
    pub fn instantiate(&self) -> Options {
        Options::clone(&self.template)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.template.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.template.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.template.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.template.len()
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    pub fn as_options(&self) -> &Options {
        &self.template
    }
}

impl From<Options> for Defaults {
    fn from(options: Options) -> Self {
        Self::new(options)
    }
}
