//! Patch application for option bags.

use crate::types::{ChangeEvent, Options};
use serde_json::Value;

/// Replace the value for `key`.
///
/// Returns the change if the stored value is different afterwards. Values
/// are compared by content: setting an array or object equal to the stored
/// one is not a change, even when it is a freshly built value.
pub fn apply_set(target: &mut Options, key: &str, value: Value) -> Option<ChangeEvent> {
    match target.get(key) {
        Some(current) if *current == value => None,
        _ => {
            target.insert(key.to_string(), value.clone());
            Some(ChangeEvent::new(key, value))
        }
    }
}

/// Apply a partial mapping to `target`.
///
/// Keys absent from `patch` are left alone. When both the current and the
/// incoming value of a key are objects they are merged recursively;
/// otherwise the incoming value replaces the current one. Returns one change
/// per top-level key whose value actually changed, in the patch's key order.
pub fn apply_patch(target: &mut Options, patch: Options) -> Vec<ChangeEvent> {
    patch
        .into_iter()
        .filter_map(|(key, incoming)| apply_entry(target, key, incoming))
        .collect()
}

/// Apply a single patch entry to `target`.
///
/// Objects on both sides are merged recursively; anything else replaces the
/// current value. Returns the change if the stored value is different
/// afterwards.
pub fn apply_entry(target: &mut Options, key: String, incoming: Value) -> Option<ChangeEvent> {
    match (target.get_mut(&key), incoming) {
        (Some(Value::Object(current)), Value::Object(incoming)) => {
            if merge_object(current, incoming) {
                Some(ChangeEvent::new(key, Value::Object(current.clone())))
            } else {
                None
            }
        }
        (_, incoming) => apply_set(target, &key, incoming),
    }
}

/// Deep-merge `incoming` into `current`. Returns true if anything changed.
fn merge_object(current: &mut Options, incoming: Options) -> bool {
    let mut changed = false;

    for (key, value) in incoming {
        match (current.get_mut(&key), value) {
            (Some(Value::Object(nested)), Value::Object(value)) => {
                changed |= merge_object(nested, value);
            }
            (Some(existing), value) => {
                if *existing != value {
                    *existing = value;
                    changed = true;
                }
            }
            (None, value) => {
                current.insert(key, value);
                changed = true;
            }
        }
    }

    changed
}
