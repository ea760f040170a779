//! The contract storage store: (address, slot key) → slot value, with copy-on-write
//! capture and a generation-tagged working cache for hot reads.

use std::{
    mem,
    sync::{Arc, RwLock},
};

use kiln_types::{StorageKey, StorageValue, H256};

use crate::{
    cache::{CacheValue, LruCache},
    cow::{PagedMap, PagedMapHandle},
    generation::{Generation, StateGeneration},
    metrics::METRICS,
};

/// Immutable capture of the storage store at an instant.
pub type StorageHandle = PagedMapHandle<StorageValue>;

/// [`StorageValue`] together with the state generation at which it was loaded from the
/// canonical store. An entry whose generation does not match the live counter is treated as
/// absent regardless of how it got into the cache, so a revert needs no explicit cache
/// clearing to be observed here.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TaggedStorageValue {
    value: StorageValue,
    loaded_at: Generation,
}

impl CacheValue<H256> for TaggedStorageValue {
    fn cache_weight(&self) -> u32 {
        const WEIGHT: usize = mem::size_of::<TaggedStorageValue>() + mem::size_of::<H256>();
        // ^ Cached values are of uniform size.
        WEIGHT as u32
    }
}

#[derive(Debug)]
struct ValuesCacheInner {
    /// State generation the cache as a whole is valid for. Lags behind the live counter
    /// until the first access after a restore sweeps the cache.
    valid_for: Generation,
    values: LruCache<H256, TaggedStorageValue>,
}

/// Working cache for hot storage slots, shared by all readers of the store.
///
/// Almost all cache ops require only shared access to the lock (including inserts, since
/// the underlying LRU cache is internally synchronized); exclusive access is needed only to
/// advance `valid_for` after a generation change.
#[derive(Debug, Clone)]
struct ValuesCache(Arc<RwLock<ValuesCacheInner>>);

impl ValuesCache {
    fn new(capacity: u64) -> Self {
        let inner = ValuesCacheInner {
            valid_for: Generation(0),
            values: LruCache::new("storage_values_cache", capacity),
        };
        Self(Arc::new(RwLock::new(inner)))
    }

    /// Gets the cached value for `hashed_key` provided that both the cache and the entry
    /// are tagged with the live generation `current`.
    fn get(&self, current: Generation, hashed_key: H256) -> Option<StorageValue> {
        let lock = self.0.read().expect("values cache is poisoned");
        if lock.valid_for != current {
            // The restore that bumped the counter has not been observed by this cache yet;
            // nothing in it can be trusted.
            METRICS.stale_values.inc();
            return None;
        }

        let tagged_value = lock.values.get(&hashed_key)?;
        if tagged_value.loaded_at == current {
            Some(tagged_value.value)
        } else {
            METRICS.stale_values.inc();
            None
        }
    }

    /// Caches `value` for `hashed_key` under the live generation `current`, sweeping the
    /// cache first if it still holds entries of an older generation.
    fn insert(&self, current: Generation, hashed_key: H256, value: StorageValue) {
        let lock = self.0.read().expect("values cache is poisoned");
        if lock.valid_for == current {
            lock.values.insert(
                hashed_key,
                TaggedStorageValue {
                    value,
                    loaded_at: current,
                },
            );
            return;
        }
        drop(lock);

        self.advance_to(current);
        let lock = self.0.read().expect("values cache is poisoned");
        if lock.valid_for == current {
            lock.values.insert(
                hashed_key,
                TaggedStorageValue {
                    value,
                    loaded_at: current,
                },
            );
        }
        // Otherwise the generation moved again while we were sweeping; the caller's value
        // may already be outdated, so not caching it is the safe choice.
    }

    fn advance_to(&self, current: Generation) {
        let mut lock = self.0.write().expect("values cache is poisoned");
        if lock.valid_for >= current {
            return;
        }
        tracing::debug!(
            "Sweeping storage values cache: generation {} -> {current}",
            lock.valid_for
        );
        lock.valid_for = current;
        lock.values.clear();
        METRICS.values_emptied.inc();
    }

    #[cfg(test)]
    fn valid_for(&self) -> Generation {
        self.0.read().expect("values cache is poisoned").valid_for
    }
}

/// Canonical store of contract storage slots.
#[derive(Debug)]
pub struct ContractStorage {
    slots: PagedMap<StorageValue>,
    cache: ValuesCache,
    generation: StateGeneration,
}

impl ContractStorage {
    pub fn new(generation: StateGeneration, cache_capacity: u64) -> Self {
        Self {
            slots: PagedMap::new(),
            cache: ValuesCache::new(cache_capacity),
            generation,
        }
    }

    /// Reads the slot at `key`, preferring the working cache. Absent slots read as zero.
    pub fn read_slot(&self, key: &StorageKey) -> StorageValue {
        let hashed_key = key.hashed_key();
        let current = self.generation.current();
        if let Some(value) = self.cache.get(current, hashed_key) {
            return value;
        }

        let value = self.slots.get(&hashed_key).copied().unwrap_or_default();
        self.cache.insert(current, hashed_key, value);
        tracing::trace!(
            "read slot {:?} {:?} ({:?}/{:?})",
            hashed_key.0,
            value.0,
            key.address(),
            key.key()
        );
        value
    }

    /// Writes `value` to the slot at `key` and returns the previous value. The write goes
    /// through to the working cache so it never serves the overwritten value.
    pub fn set_slot(&mut self, key: &StorageKey, value: StorageValue) -> StorageValue {
        let hashed_key = key.hashed_key();
        let previous = self.slots.insert(hashed_key, value).unwrap_or_default();
        self.cache
            .insert(self.generation.current(), hashed_key, value);
        previous
    }

    pub fn capture(&self) -> StorageHandle {
        self.slots.capture()
    }

    /// Replaces the live slots with the captured ones and bumps the shared state
    /// generation. The working cache is not touched here: its entries become structurally
    /// unreachable because their generation tags no longer match.
    pub fn restore(&mut self, handle: &StorageHandle) {
        self.slots.restore(handle);
        let generation = self.generation.bump();
        tracing::debug!("Restored contract storage; state generation is now {generation}");
    }
}

#[cfg(test)]
mod tests {
    use kiln_types::{AccountTreeId, Address};

    use super::*;

    fn slot(key: u64) -> StorageKey {
        let account = AccountTreeId::new(Address::repeat_byte(0xfe));
        StorageKey::new(account, H256::from_low_u64_be(key))
    }

    const CACHE_CAPACITY: u64 = 1 << 20;

    #[test]
    fn absent_slot_reads_as_zero() {
        let storage = ContractStorage::new(StateGeneration::new(), CACHE_CAPACITY);
        assert_eq!(storage.read_slot(&slot(1)), H256::zero());
    }

    #[test]
    fn writes_are_visible_through_the_cache() {
        let mut storage = ContractStorage::new(StateGeneration::new(), CACHE_CAPACITY);
        let key = slot(1);
        storage.read_slot(&key); // prime the cache with the zero value
        let previous = storage.set_slot(&key, H256::from_low_u64_be(42));
        assert_eq!(previous, H256::zero());
        assert_eq!(storage.read_slot(&key), H256::from_low_u64_be(42));
    }

    #[test]
    fn restore_invalidates_cached_values_via_generation() {
        let generation = StateGeneration::new();
        let mut storage = ContractStorage::new(generation.clone(), CACHE_CAPACITY);
        let key = slot(1);
        storage.set_slot(&key, H256::from_low_u64_be(42));
        let handle = storage.capture();

        storage.set_slot(&key, H256::from_low_u64_be(43));
        assert_eq!(storage.read_slot(&key), H256::from_low_u64_be(43));
        // The working cache now holds 43 under the old generation.

        storage.restore(&handle);
        assert_eq!(storage.read_slot(&key), H256::from_low_u64_be(42));
    }

    #[test]
    fn stale_entries_are_not_served_even_if_the_cache_was_never_swept() {
        let generation = StateGeneration::new();
        let mut storage = ContractStorage::new(generation.clone(), CACHE_CAPACITY);
        let key = slot(1);
        storage.set_slot(&key, H256::from_low_u64_be(42));
        let current = generation.current();
        assert_eq!(
            storage.cache.get(current, key.hashed_key()),
            Some(H256::from_low_u64_be(42))
        );

        // A bump with no cache traffic in between: the entry is still physically present,
        // but the cache refuses to serve it.
        generation.bump();
        assert_eq!(
            storage.cache.get(generation.current(), key.hashed_key()),
            None
        );
    }

    #[test]
    fn cache_resyncs_on_first_read_after_bump() {
        let generation = StateGeneration::new();
        let storage = ContractStorage::new(generation.clone(), CACHE_CAPACITY);
        for key in 0..10 {
            storage.read_slot(&slot(key));
        }
        assert_eq!(storage.cache.valid_for(), generation.current());

        generation.bump();
        storage.read_slot(&slot(0)); // forced miss + re-insert sweeps the cache
        let current = generation.current();
        assert_eq!(storage.cache.valid_for(), current);
        assert_eq!(
            storage.cache.get(current, slot(0).hashed_key()),
            Some(H256::zero())
        );
    }
}
