//! The account ledger: address → account state, with copy-on-write capture.

use kiln_types::{hashed_address, Account, Address};

use crate::{
    cow::{PagedMap, PagedMapHandle},
    generation::StateGeneration,
};

/// Immutable capture of the ledger at an instant.
pub type LedgerHandle = PagedMapHandle<Account>;

/// Canonical store of account states.
///
/// [`Self::capture`] does not block subsequent mutation: captured pages stay reachable via
/// the handle while new writes go to freshly allocated pages.
#[derive(Debug)]
pub struct AccountLedger {
    accounts: PagedMap<Account>,
    generation: StateGeneration,
}

impl AccountLedger {
    pub fn new(generation: StateGeneration) -> Self {
        Self {
            accounts: PagedMap::new(),
            generation,
        }
    }

    /// Returns the account at `address`; absent accounts read as the default account.
    pub fn get(&self, address: &Address) -> Account {
        self.accounts
            .get(&hashed_address(address))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrites the account at `address` and returns its previous state.
    pub fn set(&mut self, address: &Address, account: Account) -> Account {
        self.accounts
            .insert(hashed_address(address), account)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn capture(&self) -> LedgerHandle {
        self.accounts.capture()
    }

    /// Replaces the live ledger contents with the captured ones and bumps the shared state
    /// generation, invalidating every cache layered above the state.
    pub fn restore(&mut self, handle: &LedgerHandle) {
        self.accounts.restore(handle);
        let generation = self.generation.bump();
        tracing::debug!("Restored account ledger; state generation is now {generation}");
    }
}

#[cfg(test)]
mod tests {
    use kiln_types::{Nonce, U256};

    use super::*;

    #[test]
    fn absent_account_reads_as_default() {
        let ledger = AccountLedger::new(StateGeneration::new());
        assert_eq!(ledger.get(&Address::repeat_byte(1)), Account::default());
        assert!(ledger.is_empty());
    }

    #[test]
    fn capture_and_restore_round_trip() {
        let generation = StateGeneration::new();
        let mut ledger = AccountLedger::new(generation.clone());
        let address = Address::repeat_byte(1);
        ledger.set(&address, Account::with_balance(100.into()));
        let handle = ledger.capture();

        let mutated = Account {
            balance: U256::from(50),
            nonce: Nonce(1),
            ..Account::default()
        };
        ledger.set(&address, mutated);
        ledger.set(&Address::repeat_byte(2), Account::with_balance(7.into()));
        assert_eq!(ledger.len(), 2);

        ledger.restore(&handle);
        assert_eq!(ledger.get(&address), Account::with_balance(100.into()));
        assert_eq!(ledger.get(&Address::repeat_byte(2)), Account::default());
        assert_eq!(ledger.len(), 1);
        assert_eq!(generation.current().0, 1);
    }
}
