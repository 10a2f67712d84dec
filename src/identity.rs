//! Model identity assignment.
//!
//! Every model draws its id from an [`IdGenerator`]. Unless a generator is
//! injected through [`ModelConfig`](crate::ModelConfig), models share the
//! process-wide counter returned by [`global`], which starts at zero and is
//! never rolled back.

use crate::types::ModelId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Source of model identities.
pub trait IdGenerator: Send + Sync {
    /// Take the next id. Ids are never handed out twice.
    fn next_id(&self) -> ModelId;

    /// The id the next call to `next_id` will return.
    fn peek(&self) -> ModelId;
}

/// Monotonic atomic counter.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Rewind or advance the counter. Intended for deterministic tests.
    pub fn reset(&self, next: u64) {
        self.next.store(next, Ordering::SeqCst);
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> ModelId {
        ModelId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn peek(&self) -> ModelId {
        ModelId(self.next.load(Ordering::SeqCst))
    }
}

static GLOBAL_IDS: OnceLock<Arc<SequentialIds>> = OnceLock::new();

/// The process-wide id counter shared by all models.
pub fn global() -> Arc<dyn IdGenerator> {
    GLOBAL_IDS
        .get_or_init(|| Arc::new(SequentialIds::new()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new();
        assert_eq!(ids.peek(), ModelId(0));
        assert_eq!(ids.next_id(), ModelId(0));
        assert_eq!(ids.next_id(), ModelId(1));
        assert_eq!(ids.peek(), ModelId(2));
    }

    #[test]
    fn test_reset() {
        let ids = SequentialIds::starting_at(10);
        assert_eq!(ids.next_id(), ModelId(10));

        ids.reset(3);
        assert_eq!(ids.next_id(), ModelId(3));
    }

    #[test]
    fn test_global_is_shared() {
        let a = global();
        let b = global();

        let first = a.next_id();
        let second = b.next_id();
        assert!(second > first);
    }

    #[test]
    fn test_concurrent_ids_unique() {
        let ids = Arc::new(SequentialIds::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {:?}", id);
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(ids.peek(), ModelId(1000));
    }
}
