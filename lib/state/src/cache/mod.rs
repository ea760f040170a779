//! Working caches layered above the canonical state stores.

pub(crate) use self::lru_cache::LruCache;

mod lru_cache;
mod metrics;

type MokaBase<K, V> = mini_moka::sync::Cache<K, V>;

/// Trait for values that can be put into caches. Used to estimate the memory footprint of
/// a cache entry.
pub(crate) trait CacheValue<K>: Clone + Send + Sync {
    /// Weight of the value in the cache, usually measured in bytes.
    fn cache_weight(&self) -> u32;
}
