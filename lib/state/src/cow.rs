//! Copy-on-write page table underlying the account ledger and the contract storage store.

use std::{collections::HashMap, sync::Arc};

use kiln_types::H256;

/// Fan-out of the page table. Entries are assigned to pages by the first byte of their
/// hashed key, which is uniformly distributed by construction.
const PAGE_COUNT: usize = 256;

#[derive(Debug, Clone, Default, PartialEq)]
struct Page<V> {
    entries: HashMap<H256, V>,
}

/// Map from hashed keys to values with O(1) state capture.
///
/// Pages are shared between the live map and captured [`PagedMapHandle`]s via `Arc`;
/// a write clones only the affected page if it is shared. Capturing therefore costs a root
/// clone regardless of the store size, and the cost of writes is proportional to the volume
/// of data mutated since the last capture, not to the total store size.
#[derive(Debug, Clone)]
pub struct PagedMap<V> {
    pages: Vec<Arc<Page<V>>>,
}

/// Immutable capture of a [`PagedMap`] at an instant. Cheap to clone; keeps the captured
/// pages alive for as long as the handle exists.
#[derive(Debug, Clone)]
pub struct PagedMapHandle<V> {
    pages: Vec<Arc<Page<V>>>,
}

impl<V> Default for PagedMap<V> {
    fn default() -> Self {
        let pages = (0..PAGE_COUNT)
            .map(|_| {
                Arc::new(Page {
                    entries: HashMap::new(),
                })
            })
            .collect();
        Self { pages }
    }
}

impl<V: Clone> PagedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn page_index(key: &H256) -> usize {
        key.as_bytes()[0] as usize
    }

    pub fn get(&self, key: &H256) -> Option<&V> {
        self.pages[Self::page_index(key)].entries.get(key)
    }

    pub fn insert(&mut self, key: H256, value: V) -> Option<V> {
        let page = Arc::make_mut(&mut self.pages[Self::page_index(&key)]);
        page.entries.insert(key, value)
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|page| page.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|page| page.entries.is_empty())
    }

    /// Captures the current contents. Clones the page-table root only; no page is copied.
    pub fn capture(&self) -> PagedMapHandle<V> {
        PagedMapHandle {
            pages: self.pages.clone(),
        }
    }

    /// Replaces the live contents with the captured ones. The previous pages stay alive if
    /// another handle still references them.
    pub fn restore(&mut self, handle: &PagedMapHandle<V>) {
        self.pages.clone_from(&handle.pages);
    }
}

impl<V: PartialEq> PartialEq for PagedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.pages
            .iter()
            .zip(&other.pages)
            .all(|(lhs, rhs)| Arc::ptr_eq(lhs, rhs) || lhs == rhs)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn key(byte: u8, low: u64) -> H256 {
        let mut key = H256::from_low_u64_be(low);
        key.0[0] = byte;
        key
    }

    #[test]
    fn insert_and_get_round_trip() {
        let mut map = PagedMap::new();
        assert!(map.is_empty());
        assert_eq!(map.insert(key(1, 1), 11), None);
        assert_eq!(map.insert(key(1, 1), 12), Some(11));
        assert_eq!(map.get(&key(1, 1)), Some(&12));
        assert_eq!(map.get(&key(1, 2)), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn capture_then_mutate_does_not_disturb_the_handle() {
        let mut map = PagedMap::new();
        map.insert(key(1, 1), 11);
        let handle = map.capture();

        map.insert(key(1, 1), 12);
        map.insert(key(2, 2), 22);
        assert_eq!(map.get(&key(1, 1)), Some(&12));

        map.restore(&handle);
        assert_eq!(map.get(&key(1, 1)), Some(&11));
        assert_eq!(map.get(&key(2, 2)), None);
    }

    #[test]
    fn writes_clone_only_the_touched_page() {
        let mut map = PagedMap::new();
        map.insert(key(1, 1), 11);
        map.insert(key(2, 2), 22);
        let handle = map.capture();

        map.insert(key(1, 1), 12);
        assert!(!Arc::ptr_eq(&map.pages[1], &handle.pages[1]));
        assert!(Arc::ptr_eq(&map.pages[2], &handle.pages[2]));
    }

    #[test]
    fn restore_is_equivalent_to_the_captured_contents() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut map = PagedMap::new();
        for _ in 0..1_000 {
            map.insert(H256::from_low_u64_be(rng.gen_range(0..500)), rng.gen::<u64>());
        }
        let reference = map.clone();
        let handle = map.capture();

        for _ in 0..1_000 {
            map.insert(H256::from_low_u64_be(rng.gen_range(0..500)), rng.gen::<u64>());
        }
        map.restore(&handle);
        assert_eq!(map, reference);
    }
}
