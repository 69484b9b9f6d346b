//! Per-filename locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out one mutex per document name so attempts on the same document
/// run one at a time while different documents proceed independently.
#[derive(Debug, Default)]
pub(crate) struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `filename`.
    pub(crate) fn get(&self, filename: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(filename.to_string()).or_default())
    }

    /// Drop locks nobody holds.
    pub(crate) fn prune(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.get("a.pdf");
        let b = registry.get("a.pdf");
        let c = registry.get("c.pdf");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_prune_keeps_held_locks() {
        let registry = LockRegistry::new();
        let held = registry.get("a.pdf");
        drop(registry.get("b.pdf"));

        registry.prune();
        assert!(Arc::ptr_eq(&held, &registry.get("a.pdf")));
        assert_eq!(registry.locks.lock().unwrap().len(), 1);
    }
}
