use blake2::{Blake2s256, Digest};
use kiln_basic_types::{AccountTreeId, Address, H256};
use serde::{Deserialize, Serialize};

pub mod log;

/// Typed fully-qualified key of the contract storage: a contract address plus a 256-bit
/// slot key within that contract.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StorageKey {
    account: AccountTreeId,
    key: H256,
}

impl StorageKey {
    pub fn new(account: AccountTreeId, key: H256) -> Self {
        Self { account, key }
    }

    pub fn account(&self) -> &AccountTreeId {
        &self.account
    }

    pub fn address(&self) -> &Address {
        self.account.address()
    }

    pub fn key(&self) -> &H256 {
        &self.key
    }

    /// Address of the slot in the global state keyspace. All store and cache layers address
    /// slots by this hash, so a single keyspace covers every contract.
    pub fn hashed_key(&self) -> H256 {
        Self::raw_hashed_key(self.address(), self.key()).into()
    }

    pub fn raw_hashed_key(address: &Address, key: &H256) -> [u8; 32] {
        let mut bytes = [0_u8; 64];
        bytes[12..32].copy_from_slice(&address.to_fixed_bytes());
        bytes[32..64].copy_from_slice(key.as_bytes());
        Blake2s256::digest(bytes).into()
    }
}

/// Address of an account in the ledger keyspace. Shares the derivation with
/// [`StorageKey::hashed_key`] (the account is treated as slot zero of itself), which keeps
/// both stores uniformly distributed over the copy-on-write page table.
pub fn hashed_address(address: &Address) -> H256 {
    StorageKey::raw_hashed_key(address, &H256::zero()).into()
}

/// Canonical value type of a single storage slot.
pub type StorageValue = H256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_key_is_deterministic_and_collision_averse() {
        let account = AccountTreeId::new(Address::repeat_byte(0xfe));
        let key = StorageKey::new(account, H256::from_low_u64_be(61));

        assert_eq!(key.hashed_key(), key.hashed_key());
        let other_slot = StorageKey::new(account, H256::from_low_u64_be(62));
        assert_ne!(key.hashed_key(), other_slot.hashed_key());
        let other_account = StorageKey::new(
            AccountTreeId::new(Address::repeat_byte(0xff)),
            H256::from_low_u64_be(61),
        );
        assert_ne!(key.hashed_key(), other_account.hashed_key());
    }

    #[test]
    fn hashed_address_differs_from_slot_keys_of_other_accounts() {
        let address = Address::repeat_byte(0x11);
        let hashed = hashed_address(&address);
        assert_eq!(hashed, hashed_address(&address));
        assert_ne!(hashed, hashed_address(&Address::repeat_byte(0x12)));
    }
}
