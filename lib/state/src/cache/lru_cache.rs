use std::hash::Hash;

use crate::cache::{
    metrics::{RequestOutcome, METRICS},
    CacheValue, MokaBase,
};

/// Cache with LRU eviction, bounded by the total weight of its entries.
#[derive(Debug, Clone)]
pub(crate) struct LruCache<K: Eq + Hash, V> {
    name: &'static str,
    cache: MokaBase<K, V>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: CacheValue<K> + 'static,
{
    /// Creates a new cache with the specified capacity in bytes.
    pub fn new(name: &'static str, capacity: u64) -> Self {
        tracing::info!("Configured LRU cache `{name}` with capacity {capacity}B");
        let cache = MokaBase::<K, V>::builder()
            .weigher(|_, value| value.cache_weight())
            .max_capacity(capacity)
            .build();
        Self { name, cache }
    }

    /// Gets an entry and pulls it to the front if it exists.
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.cache.get(key);
        METRICS.requests[&(self.name, RequestOutcome::from_hit(entry.is_some()))].inc();
        entry
    }

    /// Pushes an entry, evicting colder entries if the cache is over capacity.
    pub fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value);
        self.report_size();
    }

    /// Removes all entries from this cache.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.report_size();
    }

    fn report_size(&self) {
        METRICS.len[&self.name].set(self.cache.entry_count());
        METRICS.used_memory[&self.name].set(self.cache.weighted_size());
    }
}
