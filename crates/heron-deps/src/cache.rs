//! Per-request dependency cache.

use crate::args::ArgValue;
use crate::dependency::DependencyId;
use heron_core::{HttpError, ValidationError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// What a cached dependency produced.
#[derive(Debug, Clone)]
pub enum Cached {
    /// The dependency resolved to this value.
    Value(ArgValue),
    /// The dependency did not produce a value.
    ///
    /// Only the errors raised by this dependency's own parameters and
    /// callable are kept. A failure inherited from an input carries nothing,
    /// since the input has its own entry.
    Failed {
        /// Field errors from this dependency's parameters.
        errors: Vec<ValidationError>,
        /// The domain error its callable raised, if any.
        domain: Option<HttpError>,
    },
}

impl Cached {
    /// A failure inherited from an input.
    #[must_use]
    pub fn inherited_failure() -> Self {
        Self::Failed {
            errors: Vec::new(),
            domain: None,
        }
    }

    /// Whether this entry holds a value.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Results of cacheable dependencies for exactly one request.
///
/// The resolver creates a fresh cache per request. A caller that resolves
/// several plans within one request may pass the same cache to each so that
/// shared dependencies still run once. Cloning shares the same storage.
///
/// ```
/// use heron_deps::{ArgValue, Cached, Dependency, DependencyCache};
/// use serde_json::json;
///
/// let dep = Dependency::builder("settings").sync_fn(|_| Ok(json!({"debug": true})));
/// let cache = DependencyCache::new();
/// assert!(cache.get(dep.id()).is_none());
///
/// cache.insert(dep.id(), Cached::Value(ArgValue::from(json!(1))));
/// assert!(matches!(cache.get(dep.id()), Some(Cached::Value(_))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    entries: Arc<Mutex<HashMap<DependencyId, Cached>>>,
}

impl DependencyCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `id`.
    #[must_use]
    pub fn get(&self, id: DependencyId) -> Option<Cached> {
        self.entries.lock().get(&id).cloned()
    }

    /// Stores a result. An existing entry is kept.
    pub fn insert(&self, id: DependencyId, result: Cached) {
        self.entries.lock().entry(id).or_insert(result);
    }

    /// Number of cached dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use serde_json::json;

    #[test]
    fn test_first_result_wins() {
        let dep = Dependency::builder("d").sync_fn(|_| Ok(()));
        let cache = DependencyCache::new();

        cache.insert(dep.id(), Cached::Value(ArgValue::from(json!("first"))));
        cache.insert(dep.id(), Cached::inherited_failure());

        match cache.get(dep.id()) {
            Some(Cached::Value(v)) => assert_eq!(v.as_json(), Some(&json!("first"))),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let dep = Dependency::builder("d").sync_fn(|_| Ok(()));
        let cache = DependencyCache::new();
        let shared = cache.clone();

        shared.insert(dep.id(), Cached::inherited_failure());
        assert!(!cache.is_empty());
    }
}
