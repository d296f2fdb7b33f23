//! Bounded cache of abstract-state handles.
//!
//! Re-creating an abstract state for every query is expensive, so states
//! are kept per `(backend, fluid)` pair.  The cache is bounded: when full,
//! the entry inserted longest ago is released and removed, regardless of
//! how recently it was used.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::error::{CoolpropError, Result};
use crate::module::{AbstractState, PropertyModule};

/// Default number of cached abstract states.
pub const STATE_CACHE_CAPACITY: usize = 100;

/// Composite cache key.  A typed pair rather than a separator-joined
/// string, so distinct `(backend, fluid)` pairs can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub backend: String,
    pub fluid: String,
}

impl StateKey {
    pub fn new(backend: &str, fluid: &str) -> Self {
        Self {
            backend: backend.to_string(),
            fluid: fluid.to_string(),
        }
    }
}

/// Insertion-order bounded map of abstract states.
///
/// Entries are evicted strictly in insertion order: a cache hit does not
/// refresh an entry's position.  Evicted states are explicitly released
/// before removal, since the engine manages their memory itself.
pub struct StateCache {
    entries: HashMap<StateKey, Box<dyn AbstractState>>,
    /// Keys in insertion order; the front is the oldest entry.
    order: VecDeque<StateKey>,
    capacity: usize,
}

impl StateCache {
    pub fn new() -> Self {
        Self::with_capacity(STATE_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Return the state for `(backend, fluid)`, constructing it through
    /// the module's factory on a miss.
    ///
    /// On a miss with the cache full, the oldest-inserted entry is
    /// released and removed first.  If construction then fails, the
    /// error propagates and nothing is inserted.  The module must
    /// already be loaded; this never triggers loading.
    pub fn get_or_create(
        &mut self,
        module: &dyn PropertyModule,
        fluid: &str,
        backend: &str,
    ) -> Result<&mut dyn AbstractState> {
        let key = StateKey::new(backend, fluid);
        if !self.entries.contains_key(&key) {
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            let state = module.factory(backend, fluid)?;
            self.order.push_back(key.clone());
            self.entries.insert(key.clone(), state);
            debug!(backend, fluid, size = self.entries.len(), "cached new abstract state");
        }
        match self.entries.get_mut(&key) {
            Some(state) => Ok(state.as_mut()),
            None => Err(CoolpropError::Calculation(
                "state cache lost a just-inserted entry".into(),
            )),
        }
    }

    fn evict_oldest(&mut self) {
        let Some(key) = self.order.pop_front() else {
            return;
        };
        if let Some(mut state) = self.entries.remove(&key) {
            state.release();
            debug!(backend = %key.backend, fluid = %key.fluid, "evicted oldest abstract state");
        }
    }

    /// Release and drop every entry.
    pub fn clear(&mut self) {
        for (_, mut state) in self.entries.drain() {
            state.release();
        }
        self.order.clear();
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testutil::MockModule;

    #[test]
    fn distinct_backend_fluid_pairs_never_collide() {
        let module = MockModule::new();
        let mut cache = StateCache::new();

        cache.get_or_create(&module, "Water", "HEOS").unwrap();
        cache.get_or_create(&module, "Air", "REFPROP").unwrap();
        cache.get_or_create(&module, "Air", "HEOS").unwrap();
        cache.get_or_create(&module, "Water", "REFPROP").unwrap();

        assert_eq!(cache.len(), 4);
        assert_eq!(module.factory_calls.load(Ordering::SeqCst), 4);

        // All four are hits now; no further construction.
        cache.get_or_create(&module, "Water", "HEOS").unwrap();
        cache.get_or_create(&module, "Air", "REFPROP").unwrap();
        assert_eq!(module.factory_calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn overflow_evicts_and_releases_the_oldest_entry() {
        let module = MockModule::new();
        let mut cache = StateCache::with_capacity(3);

        cache.get_or_create(&module, "F1", "HEOS").unwrap();
        cache.get_or_create(&module, "F2", "HEOS").unwrap();
        cache.get_or_create(&module, "F3", "HEOS").unwrap();
        assert_eq!(cache.len(), 3);
        assert!(module.released_labels().is_empty());

        cache.get_or_create(&module, "F4", "HEOS").unwrap();

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&StateKey::new("HEOS", "F1")));
        assert!(cache.contains(&StateKey::new("HEOS", "F4")));
        assert_eq!(module.released_labels(), vec!["HEOS:F1".to_string()]);
    }

    #[test]
    fn hits_do_not_refresh_eviction_order() {
        let module = MockModule::new();
        let mut cache = StateCache::with_capacity(3);

        cache.get_or_create(&module, "F1", "HEOS").unwrap();
        cache.get_or_create(&module, "F2", "HEOS").unwrap();
        cache.get_or_create(&module, "F3", "HEOS").unwrap();

        // Re-request the oldest key capacity-1 times; its position must
        // not move.
        cache.get_or_create(&module, "F1", "HEOS").unwrap();
        cache.get_or_create(&module, "F1", "HEOS").unwrap();

        cache.get_or_create(&module, "F4", "HEOS").unwrap();

        assert!(!cache.contains(&StateKey::new("HEOS", "F1")));
        assert!(cache.contains(&StateKey::new("HEOS", "F2")));
        assert!(cache.contains(&StateKey::new("HEOS", "F3")));
        assert_eq!(module.released_labels(), vec!["HEOS:F1".to_string()]);
    }

    #[test]
    fn factory_failure_inserts_nothing() {
        let module = MockModule::new();
        let mut cache = StateCache::with_capacity(4);

        cache.get_or_create(&module, "F1", "HEOS").unwrap();
        let err = cache.get_or_create(&module, "Unobtainium", "HEOS");

        assert!(matches!(err, Err(CoolpropError::Factory { .. })));
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(&StateKey::new("HEOS", "Unobtainium")));
        assert!(module.released_labels().is_empty());

        // The cache keeps working after a failed construction.
        cache.get_or_create(&module, "F2", "HEOS").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn factory_failure_at_capacity_still_freed_the_oldest_slot() {
        let module = MockModule::new();
        let mut cache = StateCache::with_capacity(2);

        cache.get_or_create(&module, "F1", "HEOS").unwrap();
        cache.get_or_create(&module, "F2", "HEOS").unwrap();

        assert!(cache.get_or_create(&module, "Unobtainium", "HEOS").is_err());

        // The slot was reclaimed before construction was attempted.
        assert_eq!(cache.len(), 1);
        assert_eq!(module.released_labels(), vec!["HEOS:F1".to_string()]);
    }

    #[test]
    fn clear_releases_everything() {
        let module = MockModule::new();
        let mut cache = StateCache::with_capacity(4);

        cache.get_or_create(&module, "F1", "HEOS").unwrap();
        cache.get_or_create(&module, "F2", "HEOS").unwrap();
        cache.clear();

        assert!(cache.is_empty());
        let mut released = module.released_labels();
        released.sort();
        assert_eq!(released, vec!["HEOS:F1".to_string(), "HEOS:F2".to_string()]);
    }
}
