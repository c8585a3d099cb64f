//! Memory-pressure tolerant cache with a strongly held hot set.
//!
//! Values live behind [`Arc`]. The backing map only stores [`Weak`] handles,
//! so an entry stays resolvable exactly as long as something holds it:
//!
//! - the **soft layer**, an LRU with an entry budget. Its holds are dropped on
//!   capacity overflow (reported through the eviction callback) and all at
//!   once when the host signals memory pressure with
//!   [`BoundedIdentityCache::reclaim`];
//! - the **hot FIFO**, a bounded queue of recently used values. Every `put`
//!   and every successful `get` appends to it; once it exceeds its capacity
//!   the oldest hold is released;
//! - any caller still holding an `Arc` returned by the cache.
//!
//! An entry nobody holds is reclaimed. Its key remains in the backing map
//! until the next sweep (run at the start of every mutating call and of
//! [`BoundedIdentityCache::len`]) or until a `get` observes it, so `len` is an
//! upper bound between sweeps and exact right after one.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;

/// Default capacity of the hot FIFO.
pub const DEFAULT_HARD_SIZE: usize = 100;

/// Default entry budget of the soft layer.
pub const DEFAULT_SOFT_CAPACITY: usize = 10_000;

/// Callback invoked with the key of an entry whose soft hold was dropped.
pub type EvictionCallback<K> = Arc<dyn Fn(&K) + Send + Sync>;

/// Sizing of a [`BoundedIdentityCache`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundedCacheConfig {
    /// Capacity of the hot FIFO.
    pub hard_size: usize,
    /// Entry budget of the soft layer.
    pub soft_capacity: usize,
}

impl Default for BoundedCacheConfig {
    fn default() -> Self {
        Self {
            hard_size: DEFAULT_HARD_SIZE,
            soft_capacity: DEFAULT_SOFT_CAPACITY,
        }
    }
}

pub struct BoundedIdentityCache<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, Weak<V>>,
    soft: Mutex<LruCache<K, Arc<V>>>,
    hot: Mutex<VecDeque<(K, Arc<V>)>>,
    hard_size: usize,
    /// Keys that lost a cache hold and may be unreachable.
    released: Mutex<HashSet<K>>,
    on_evict: Option<EvictionCallback<K>>,
}

impl<K, V> Default for BoundedIdentityCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_HARD_SIZE)
    }
}

impl<K, V> BoundedIdentityCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Cache with the given hot FIFO capacity and the default soft budget.
    #[must_use]
    pub fn new(hard_size: usize) -> Self {
        Self::with_capacity(hard_size, DEFAULT_SOFT_CAPACITY)
    }

    #[must_use]
    pub fn with_config(cfg: &BoundedCacheConfig) -> Self {
        Self::with_capacity(cfg.hard_size, cfg.soft_capacity)
    }

    /// A zero `soft_capacity` is treated as one.
    #[must_use]
    pub fn with_capacity(hard_size: usize, soft_capacity: usize) -> Self {
        let soft_capacity = NonZeroUsize::new(soft_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            map: DashMap::new(),
            soft: Mutex::new(LruCache::new(soft_capacity)),
            hot: Mutex::new(VecDeque::with_capacity(hard_size.saturating_add(1))),
            hard_size,
            released: Mutex::new(HashSet::new()),
            on_evict: None,
        }
    }

    /// Register a callback for keys whose soft hold is dropped.
    #[must_use]
    pub fn with_eviction_callback(mut self, cb: EvictionCallback<K>) -> Self {
        self.on_evict = Some(cb);
        self
    }

    /// Resolve `key`, promoting the value into the hot FIFO.
    ///
    /// A key whose value has been reclaimed is removed and reported absent.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let weak = self.map.get(key).map(|e| Weak::clone(e.value()))?;
        if let Some(value) = weak.upgrade() {
            self.soft.lock().promote(key);
            self.promote(key.clone(), Arc::clone(&value));
            Some(value)
        } else {
            self.map.remove_if(key, |_, w| w.strong_count() == 0);
            None
        }
    }

    /// Insert `value` under `key`, returning the previous value if it is still alive.
    pub fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        self.sweep();
        let previous = self
            .map
            .insert(key.clone(), Arc::downgrade(&value))
            .and_then(|w| w.upgrade());

        let overflow = self.soft.lock().push(key.clone(), Arc::clone(&value));
        if let Some((evicted_key, evicted)) = overflow
            && evicted_key != key
        {
            drop(evicted);
            self.notify_evicted(&evicted_key);
            self.released.lock().insert(evicted_key);
        }

        self.promote(key, value);
        previous
    }

    /// Remove `key`, dropping every hold the cache has on it.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.sweep();
        let previous = self.map.remove(key).and_then(|(_, w)| w.upgrade());
        let soft = self.soft.lock().pop(key);
        let hot: VecDeque<(K, Arc<V>)> = {
            let mut q = self.hot.lock();
            let (gone, kept): (VecDeque<_>, VecDeque<_>) =
                q.drain(..).partition(|(k, _)| k == key);
            *q = kept;
            gone
        };
        drop(soft);
        drop(hot);
        previous
    }

    /// Drop every entry and every hold.
    pub fn clear(&self) {
        let hot: VecDeque<(K, Arc<V>)> = std::mem::take(&mut *self.hot.lock());
        drop(hot);
        self.soft.lock().clear();
        self.released.lock().clear();
        self.map.clear();
    }

    /// Number of keys in the backing map after purging reclaimed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sweep();
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys whose values are still resolvable.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.sweep();
        self.map
            .iter()
            .filter(|e| e.value().strong_count() > 0)
            .map(|e| e.key().clone())
            .collect()
    }

    /// Values that are still resolvable. Does not promote.
    #[must_use]
    pub fn values(&self) -> Vec<Arc<V>> {
        self.sweep();
        self.map.iter().filter_map(|e| e.value().upgrade()).collect()
    }

    /// Drop every soft hold, as a runtime would under memory pressure.
    ///
    /// Entries held by the hot FIFO (or by callers) stay resolvable.
    /// Returns how many soft holds were released.
    pub fn reclaim(&self) -> usize {
        let dropped: Vec<(K, Arc<V>)> = {
            let mut soft = self.soft.lock();
            let mut out = Vec::with_capacity(soft.len());
            while let Some(entry) = soft.pop_lru() {
                out.push(entry);
            }
            out
        };
        let count = dropped.len();
        let keys: Vec<K> = dropped.into_iter().map(|(k, _)| k).collect();
        for k in &keys {
            self.notify_evicted(k);
        }
        self.released.lock().extend(keys);
        tracing::debug!(released = count, "Reclaimed soft cache holds");
        count
    }

    /// Current number of hot FIFO holds.
    #[must_use]
    pub fn hot_len(&self) -> usize {
        self.hot.lock().len()
    }

    /// Whether `key` currently has a hot FIFO hold.
    #[must_use]
    pub fn is_hot(&self, key: &K) -> bool {
        self.hot.lock().iter().any(|(k, _)| k == key)
    }

    /// Current number of soft holds.
    #[must_use]
    pub fn soft_len(&self) -> usize {
        self.soft.lock().len()
    }

    #[must_use]
    pub fn hard_size(&self) -> usize {
        self.hard_size
    }

    fn promote(&self, key: K, value: Arc<V>) {
        let demoted = {
            let mut q = self.hot.lock();
            q.push_back((key, value));
            if q.len() > self.hard_size {
                q.pop_front()
            } else {
                None
            }
        };
        if let Some((k, v)) = demoted {
            drop(v);
            self.released.lock().insert(k);
        }
    }

    /// Purge released keys nobody holds. Keys still alive only through a
    /// caller stay queued until that caller lets go.
    fn sweep(&self) {
        let keys = std::mem::take(&mut *self.released.lock());
        if keys.is_empty() {
            return;
        }

        let mut caller_held = Vec::new();
        for k in keys {
            if self.map.remove_if(&k, |_, w| w.strong_count() == 0).is_some() {
                continue;
            }
            let alive = self.map.get(&k).is_some_and(|w| w.strong_count() > 0);
            if alive && !self.held_by_cache(&k) {
                caller_held.push(k);
            }
        }
        if !caller_held.is_empty() {
            self.released.lock().extend(caller_held);
        }
    }

    fn held_by_cache(&self, key: &K) -> bool {
        self.soft.lock().contains(key) || self.is_hot(key)
    }

    fn notify_evicted(&self, key: &K) {
        if let Some(cb) = &self.on_evict {
            cb(key);
        }
    }
}
