//! Option storage.
//!
//! A model's values live in an [`OptionsStore`] seeded from an immutable
//! [`Defaults`] template. Writes go through [`apply_set`] and [`apply_patch`],
//! which report one change per key whose value actually changed.

mod defaults;
mod merge;
mod store;

pub use defaults::Defaults;
pub use merge::{apply_entry, apply_patch, apply_set};
pub use store::OptionsStore;
