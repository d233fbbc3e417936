//! Bounded per-hook per-session state, backed by an LRU cache.
//!
//! Each hook that needs cross-event memory (cooldown counters, dedupe
//! marks, token-pressure history) owns one of these rather than reaching
//! into a shared global map. Eviction is least-recently-touched, matching
//! the `SessionRuntimeMap` contract.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

pub struct SessionRuntimeMap<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> SessionRuntimeMap<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, session_id: &str) -> Option<V> {
        self.inner.lock().unwrap().get(session_id).cloned()
    }

    pub fn insert(&self, session_id: &str, value: V) {
        self.inner.lock().unwrap().put(session_id.to_string(), value);
    }

    pub fn remove(&self, session_id: &str) {
        self.inner.lock().unwrap().pop(session_id);
    }

    pub fn get_or_insert_with(&self, session_id: &str, f: impl FnOnce() -> V) -> V {
        let mut guard = self.inner.lock().unwrap();
        if let Some(existing) = guard.get(session_id) {
            return existing.clone();
        }
        let value = f();
        guard.put(session_id.to_string(), value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
