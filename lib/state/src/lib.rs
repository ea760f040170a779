//! Checkpointable world state of the Kiln sandbox chain.
//!
//! The state consists of three stores behind copy-on-write page tables: the account ledger,
//! the contract storage store and the transaction/receipt log. [`CheckpointManager`] freezes
//! all three into [`Snapshot`]s and restores them on revert; a process-wide
//! [`StateGeneration`] counter invalidates every derived cache after a restore without any
//! layer having to be cleared explicitly.

// Linter settings.
#![warn(missing_debug_implementations, bare_trait_objects)]

use std::{collections::HashMap, fmt};

use kiln_types::{Account, Address, StorageKey, StorageValue, H256};

pub use self::{
    checkpoint::{CheckpointError, CheckpointManager, Snapshot},
    contract_storage::{ContractStorage, StorageHandle},
    cow::{PagedMap, PagedMapHandle},
    generation::{Generation, StateGeneration},
    ledger::{AccountLedger, LedgerHandle},
    storage_view::{StorageModifications, StorageView, StorageViewStats},
    tx_log::{TransactionLog, TransactionLogEntry},
    world::WorldState,
};

mod cache;
mod checkpoint;
mod contract_storage;
mod cow;
mod generation;
mod ledger;
mod metrics;
mod storage_view;
mod tx_log;
mod world;

/// Functionality to read from the sandbox state.
pub trait ReadStorage: fmt::Debug {
    /// Reads the state of the account at `address`. Absent accounts read as the default
    /// (zero balance, zero nonce, no code).
    fn read_account(&mut self, address: &Address) -> Account;

    /// Reads the value of the storage slot at `key`. Absent slots read as zero.
    fn read_value(&mut self, key: &StorageKey) -> StorageValue;

    /// Loads contract bytecode by its hash.
    fn load_bytecode(&mut self, hash: H256) -> Option<Vec<u8>>;
}

/// Functionality to buffer writes on top of [`ReadStorage`] during transaction execution.
pub trait WriteStorage: ReadStorage {
    /// Sets the account state under `address` and returns the previous state.
    fn set_account(&mut self, address: Address, account: Account) -> Account;

    /// Sets the new value under `key` and returns the previous value.
    fn set_value(&mut self, key: StorageKey, value: StorageValue) -> StorageValue;

    /// Returns a map with the storage slots updated so far.
    fn modified_storage_keys(&self) -> &HashMap<StorageKey, StorageValue>;

    /// Returns a map with the accounts updated so far.
    fn modified_accounts(&self) -> &HashMap<Address, Account>;
}
