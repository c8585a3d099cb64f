//! Cache SPI used by the authorizer and the caching session DAO.
//!
//! Deployments with an external cache tier implement [`CacheManager`] over it;
//! the default is [`BoundedCacheManager`], which hands out one
//! [`BoundedIdentityCache`] per name.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

use crate::bounded::{BoundedCacheConfig, BoundedIdentityCache};

/// A named key/value cache.
pub trait Cache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Store `value`, returning the previous value if present.
    fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>>;

    fn remove(&self, key: &K) -> Option<Arc<V>>;

    fn clear(&self);

    fn keys(&self) -> Vec<K>;

    fn values(&self) -> Vec<Arc<V>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of named caches.
pub trait CacheManager<K, V>: Send + Sync {
    /// Return the cache registered under `name`, creating it on first use.
    fn get_cache(&self, name: &str) -> Arc<dyn Cache<K, V>>;
}

impl<K, V> Cache<K, V> for BoundedIdentityCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        BoundedIdentityCache::get(self, key)
    }

    fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        BoundedIdentityCache::put(self, key, value)
    }

    fn remove(&self, key: &K) -> Option<Arc<V>> {
        BoundedIdentityCache::remove(self, key)
    }

    fn clear(&self) {
        BoundedIdentityCache::clear(self);
    }

    fn keys(&self) -> Vec<K> {
        BoundedIdentityCache::keys(self)
    }

    fn values(&self) -> Vec<Arc<V>> {
        BoundedIdentityCache::values(self)
    }

    fn len(&self) -> usize {
        BoundedIdentityCache::len(self)
    }
}

/// Hands out one [`BoundedIdentityCache`] per cache name.
pub struct BoundedCacheManager<K, V>
where
    K: Eq + Hash + Clone,
{
    config: BoundedCacheConfig,
    caches: DashMap<String, Arc<BoundedIdentityCache<K, V>>>,
}

impl<K, V> Default for BoundedCacheManager<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(BoundedCacheConfig::default())
    }
}

impl<K, V> BoundedCacheManager<K, V>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new(config: BoundedCacheConfig) -> Self {
        Self {
            config,
            caches: DashMap::new(),
        }
    }

    /// Concrete handle to a named cache, for callers that need `reclaim`.
    #[must_use]
    pub fn bounded(&self, name: &str) -> Arc<BoundedIdentityCache<K, V>> {
        let entry = self.caches.entry(name.to_owned()).or_insert_with(|| {
            tracing::debug!(cache = name, "Creating bounded identity cache");
            Arc::new(BoundedIdentityCache::with_config(&self.config))
        });
        Arc::clone(entry.value())
    }

    /// Signal memory pressure to every cache. Returns the released hold count.
    pub fn reclaim_all(&self) -> usize {
        self.caches.iter().map(|c| c.value().reclaim()).sum()
    }
}

impl<K, V> CacheManager<K, V> for BoundedCacheManager<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn get_cache(&self, name: &str) -> Arc<dyn Cache<K, V>> {
        self.bounded(name)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn same_name_yields_same_cache() {
        let mgr: BoundedCacheManager<String, u32> = BoundedCacheManager::default();
        let a = mgr.get_cache("authz");
        a.put("k".to_owned(), Arc::new(1));

        let b = mgr.get_cache("authz");
        assert_eq!(b.get(&"k".to_owned()).as_deref(), Some(&1));
        assert!(mgr.get_cache("other").is_empty());
    }

    #[test]
    fn config_applies_to_created_caches() {
        let mgr: BoundedCacheManager<u32, u32> = BoundedCacheManager::new(BoundedCacheConfig {
            hard_size: 2,
            soft_capacity: 8,
        });
        let cache = mgr.bounded("sessions");
        for i in 0..4 {
            cache.put(i, Arc::new(i));
        }
        assert_eq!(cache.hard_size(), 2);
        assert_eq!(cache.hot_len(), 2);
        assert_eq!(mgr.reclaim_all(), 4);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: BoundedCacheConfig = serde_json::from_str(r#"{"hard_size": 5}"#).unwrap();
        assert_eq!(cfg.hard_size, 5);
        assert_eq!(cfg.soft_capacity, crate::bounded::DEFAULT_SOFT_CAPACITY);

        let err = serde_json::from_str::<BoundedCacheConfig>(r#"{"size": 5}"#);
        assert!(err.is_err());
    }
}
