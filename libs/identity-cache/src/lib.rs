#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Bounded identity cache and the cache SPI.

pub mod bounded;
pub mod cache;

pub use bounded::{
    BoundedCacheConfig, BoundedIdentityCache, DEFAULT_HARD_SIZE, DEFAULT_SOFT_CAPACITY,
    EvictionCallback,
};
pub use cache::{BoundedCacheManager, Cache, CacheManager};
