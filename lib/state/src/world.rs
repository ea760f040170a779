//! The explicit world-state handle threaded through the execution driver and the
//! checkpoint manager.

use std::collections::HashMap;

use kiln_types::{
    hash_bytecode, Account, Address, BlockNumber, StorageKey, StorageValue, H256,
};

use crate::{
    checkpoint::Snapshot,
    contract_storage::ContractStorage,
    generation::{Generation, StateGeneration},
    ledger::AccountLedger,
    storage_view::StorageModifications,
    tx_log::TransactionLog,
    ReadStorage,
};

/// The complete mutable state of the sandbox chain: account ledger, contract storage,
/// content-addressed bytecode store, transaction/receipt log and the current block height.
///
/// All stores share a single [`StateGeneration`] counter created here. There are no other
/// process-wide globals: whoever owns the `WorldState` owns the state.
#[derive(Debug)]
pub struct WorldState {
    ledger: AccountLedger,
    storage: ContractStorage,
    bytecodes: HashMap<H256, Vec<u8>>,
    tx_log: TransactionLog,
    block_number: BlockNumber,
    generation: StateGeneration,
}

impl WorldState {
    pub fn new(values_cache_capacity: u64) -> Self {
        let generation = StateGeneration::new();
        Self {
            ledger: AccountLedger::new(generation.clone()),
            storage: ContractStorage::new(generation.clone(), values_cache_capacity),
            bytecodes: HashMap::new(),
            tx_log: TransactionLog::new(),
            block_number: BlockNumber(0),
            generation,
        }
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AccountLedger {
        &mut self.ledger
    }

    pub fn storage(&self) -> &ContractStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut ContractStorage {
        &mut self.storage
    }

    pub fn tx_log(&self) -> &TransactionLog {
        &self.tx_log
    }

    pub fn tx_log_mut(&mut self) -> &mut TransactionLog {
        &mut self.tx_log
    }

    pub fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Seals the next block and returns its number.
    pub fn seal_block(&mut self) -> BlockNumber {
        self.block_number = self.block_number + 1;
        self.block_number
    }

    /// Stores contract bytecode and returns its content-addressed hash. Bytecode survives
    /// reverts: accounts referencing it may disappear, the code itself stays reachable.
    pub fn store_bytecode(&mut self, code: Vec<u8>) -> H256 {
        let hash = hash_bytecode(&code);
        self.bytecodes.insert(hash, code);
        hash
    }

    pub fn bytecode(&self, hash: &H256) -> Option<&Vec<u8>> {
        self.bytecodes.get(hash)
    }

    /// Applies the write set of a successfully executed transaction to the canonical
    /// stores.
    pub fn apply(&mut self, modifications: StorageModifications) {
        for (address, account) in modifications.accounts {
            self.ledger.set(&address, account);
        }
        for log in modifications.storage_logs {
            if log.is_write() {
                self.storage.set_slot(&log.key, log.value);
            }
        }
    }

    /// Restores every store to the captured snapshot. Both restores bump the shared
    /// generation counter, so by the time this returns no cache can serve pre-restore data.
    pub(crate) fn rollback_to(&mut self, snapshot: &Snapshot) {
        self.ledger.restore(snapshot.ledger_handle());
        self.storage.restore(snapshot.storage_handle());
        self.tx_log.truncate_to(snapshot.log_tail());
        self.block_number = snapshot.block_number();
    }
}

impl ReadStorage for &WorldState {
    fn read_account(&mut self, address: &Address) -> Account {
        self.ledger.get(address)
    }

    fn read_value(&mut self, key: &StorageKey) -> StorageValue {
        self.storage.read_slot(key)
    }

    fn load_bytecode(&mut self, hash: H256) -> Option<Vec<u8>> {
        self.bytecodes.get(&hash).cloned()
    }
}

impl ReadStorage for WorldState {
    fn read_account(&mut self, address: &Address) -> Account {
        (&*self).read_account(address)
    }

    fn read_value(&mut self, key: &StorageKey) -> StorageValue {
        (&*self).read_value(key)
    }

    fn load_bytecode(&mut self, hash: H256) -> Option<Vec<u8>> {
        (&*self).load_bytecode(hash)
    }
}

#[cfg(test)]
mod tests {
    use kiln_types::{AccountTreeId, StorageLog};

    use super::*;

    const CACHE_CAPACITY: u64 = 1 << 20;

    #[test]
    fn seal_block_increments_height() {
        let mut state = WorldState::new(CACHE_CAPACITY);
        assert_eq!(state.block_number(), BlockNumber(0));
        assert_eq!(state.seal_block(), BlockNumber(1));
        assert_eq!(state.block_number(), BlockNumber(1));
    }

    #[test]
    fn apply_writes_both_stores() {
        let mut state = WorldState::new(CACHE_CAPACITY);
        let address = Address::repeat_byte(0x11);
        let key = StorageKey::new(AccountTreeId::new(address), H256::from_low_u64_be(1));

        let mut modifications = StorageModifications::default();
        modifications
            .accounts
            .insert(address, Account::with_balance(100.into()));
        modifications
            .storage_logs
            .push(StorageLog::new_write_log(key, H256::from_low_u64_be(42)));
        state.apply(modifications);

        assert_eq!(state.ledger().get(&address).balance, 100.into());
        assert_eq!(state.storage().read_slot(&key), H256::from_low_u64_be(42));
    }

    #[test]
    fn bytecode_is_content_addressed() {
        let mut state = WorldState::new(CACHE_CAPACITY);
        let hash = state.store_bytecode(vec![0x60, 0x60]);
        assert_eq!(state.bytecode(&hash), Some(&vec![0x60, 0x60]));
        assert_eq!(state.bytecode(&H256::zero()), None);
    }
}
