//! # Observable Model
//!
//! A small data-model base: a bag of named option values seeded from
//! per-kind defaults, patched in place, and observable key by key.
//!
//! ## Core Concepts
//!
//! - **Defaults**: Immutable per-kind template every instance copies
//! - **Options store**: Live values; raises one `change` notice per changed key
//! - **Model**: Republishes each notice as `change:<key>` on its public channel
//! - **Identity**: Every model gets a unique, increasing id
//!
//! ## Example
//!
//! ```ignore
//! use observable_model::{Defaults, Model};
//! use serde_json::json;
//!
//! let alarm = Model::new(Defaults::from_value(json!({
//!     "time": "23:55",
//!     "active": false
//! })));
//!
//! alarm.on_change("active", |value| println!("active: {}", value));
//! alarm.set("active", true)?;
//!
//! assert_eq!(alarm.serialize()?, r#"{"active":true,"time":"23:55"}"#);
//! ```

pub mod error;
pub mod events;
pub mod identity;
pub mod model;
pub mod options;
pub mod types;

// Re-exports
pub use error::{ModelError, Result};
pub use events::{EventRouter, WatchConfig, WatchHandle};
pub use identity::{IdGenerator, SequentialIds};
pub use model::{deserialize, Model, ModelConfig, ModelKind, UnknownKeyPolicy};
pub use options::{apply_entry, apply_patch, apply_set, Defaults, OptionsStore};
pub use types::*;
