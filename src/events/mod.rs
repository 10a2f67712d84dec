//! Event delivery for models.
//!
//! - [`EventRouter`]: synchronous named-event publish/subscribe
//! - [`WatchHandle`]: bounded channel fed by a router, for consumers that
//!   prefer pulling changes over registering callbacks
//!
//! # Example
//!
//! ```ignore
//! let handle = model.watch(WatchConfig::keys(vec!["name".to_string()]));
//!
//! model.set("name", json!("Work"))?;
//!
//! while let Ok(change) = handle.try_recv() {
//!     println!("{} -> {}", change.key, change.value);
//! }
//! ```

mod router;
mod watch;

pub use router::{AnyHandler, EventRouter, Handler};
pub use watch::{WatchConfig, WatchHandle};
