//! Buffer between the canonical stores and transaction execution.

use std::{
    collections::HashMap,
    fmt, mem,
    time::{Duration, Instant},
};

use kiln_types::{Account, Address, StorageKey, StorageLog, StorageValue, H256};

use crate::{ReadStorage, WriteStorage};

/// Statistics for [`StorageView`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StorageViewStats {
    /// Estimated byte size of the caches used by the view.
    pub cache_size: usize,
    /// Number of read ops for which the value was fetched from the underlying storage.
    pub storage_invocations_missed: usize,
    /// Number of processed read ops.
    pub get_value_storage_invocations: usize,
    /// Number of processed write ops.
    pub set_value_storage_invocations: usize,
    /// Cumulative time spent on fetching data from the underlying storage.
    pub time_spent_on_storage_missed: Duration,
}

/// Write set of a finished execution, to be applied to the canonical stores via
/// [`WorldState::apply`](crate::WorldState::apply).
#[derive(Debug, Default)]
pub struct StorageModifications {
    pub accounts: HashMap<Address, Account>,
    pub storage_logs: Vec<StorageLog>,
}

/// `StorageView` buffers reads and writes of a single transaction execution.
///
/// Writes stay in the view until the driver decides the execution succeeded and applies
/// [`Self::into_modifications`] to the canonical stores; a failed execution simply drops
/// the view. A view must not outlive a snapshot or revert control operation: it is created
/// and consumed within one execution, so its private read cache cannot go stale.
#[derive(Debug)]
pub struct StorageView<S> {
    storage_handle: S,
    // Used for caching and to get the list of modified keys.
    modified_storage_keys: HashMap<StorageKey, StorageValue>,
    modified_accounts: HashMap<Address, Account>,
    // Used purely for caching.
    read_storage_keys: HashMap<StorageKey, StorageValue>,
    read_accounts: HashMap<Address, Account>,
    stats: StorageViewStats,
}

impl<S: ReadStorage> StorageView<S> {
    /// Creates a new storage view based on the underlying storage.
    pub fn new(storage_handle: S) -> Self {
        Self {
            storage_handle,
            modified_storage_keys: HashMap::new(),
            modified_accounts: HashMap::new(),
            read_storage_keys: HashMap::new(),
            read_accounts: HashMap::new(),
            stats: StorageViewStats::default(),
        }
    }

    fn get_value_no_log(&mut self, key: &StorageKey) -> StorageValue {
        let started_at = Instant::now();
        let cached_value = self
            .modified_storage_keys
            .get(key)
            .or_else(|| self.read_storage_keys.get(key));

        cached_value.copied().unwrap_or_else(|| {
            let value = self.storage_handle.read_value(key);
            self.read_storage_keys.insert(*key, value);
            self.stats.time_spent_on_storage_missed += started_at.elapsed();
            self.stats.storage_invocations_missed += 1;
            value
        })
    }

    fn get_account_no_log(&mut self, address: &Address) -> Account {
        let started_at = Instant::now();
        let cached_account = self
            .modified_accounts
            .get(address)
            .or_else(|| self.read_accounts.get(address));

        cached_account.copied().unwrap_or_else(|| {
            let account = self.storage_handle.read_account(address);
            self.read_accounts.insert(*address, account);
            self.stats.time_spent_on_storage_missed += started_at.elapsed();
            self.stats.storage_invocations_missed += 1;
            account
        })
    }

    fn cache_size(&self) -> usize {
        self.modified_storage_keys.len() * mem::size_of::<(StorageKey, StorageValue)>()
            + self.read_storage_keys.len() * mem::size_of::<(StorageKey, StorageValue)>()
            + (self.modified_accounts.len() + self.read_accounts.len())
                * mem::size_of::<(Address, Account)>()
    }

    /// Returns the current storage access stats.
    pub fn stats(&self) -> StorageViewStats {
        StorageViewStats {
            cache_size: self.cache_size(),
            ..self.stats
        }
    }

    /// Consumes the view, returning the accumulated write set as storage logs.
    pub fn into_modifications(self) -> StorageModifications {
        let storage_logs = self
            .modified_storage_keys
            .into_iter()
            .map(|(key, value)| StorageLog::new_write_log(key, value))
            .collect();
        StorageModifications {
            accounts: self.modified_accounts,
            storage_logs,
        }
    }
}

impl<S: ReadStorage + fmt::Debug> ReadStorage for StorageView<S> {
    fn read_account(&mut self, address: &Address) -> Account {
        self.stats.get_value_storage_invocations += 1;
        self.get_account_no_log(address)
    }

    fn read_value(&mut self, key: &StorageKey) -> StorageValue {
        self.stats.get_value_storage_invocations += 1;
        let value = self.get_value_no_log(key);
        tracing::trace!(
            "read value {:?} {:?} ({:?}/{:?})",
            key.hashed_key().0,
            value.0,
            key.address(),
            key.key()
        );
        value
    }

    fn load_bytecode(&mut self, hash: H256) -> Option<Vec<u8>> {
        self.storage_handle.load_bytecode(hash)
    }
}

impl<S: ReadStorage + fmt::Debug> WriteStorage for StorageView<S> {
    fn set_account(&mut self, address: Address, account: Account) -> Account {
        self.stats.set_value_storage_invocations += 1;
        let original = self.get_account_no_log(&address);
        self.modified_accounts.insert(address, account);
        original
    }

    fn set_value(&mut self, key: StorageKey, value: StorageValue) -> StorageValue {
        self.stats.set_value_storage_invocations += 1;
        let original = self.get_value_no_log(&key);
        tracing::trace!(
            "write value {:?} value: {:?} original value: {:?} ({:?}/{:?})",
            key.hashed_key().0,
            value,
            original,
            key.address(),
            key.key()
        );
        self.modified_storage_keys.insert(key, value);
        original
    }

    fn modified_storage_keys(&self) -> &HashMap<StorageKey, StorageValue> {
        &self.modified_storage_keys
    }

    fn modified_accounts(&self) -> &HashMap<Address, Account> {
        &self.modified_accounts
    }
}
