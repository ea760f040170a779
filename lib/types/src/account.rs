use kiln_basic_types::{Nonce, H256, U256};
use serde::{Deserialize, Serialize};

/// State of a single account in the ledger: its balance, transaction count and a reference
/// to the immutable bytecode deployed at the address (zero for externally owned accounts).
///
/// Balance and nonce are mutated only by transaction execution or revert restoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: U256,
    pub nonce: Nonce,
    pub code_hash: H256,
}

impl Account {
    /// Externally owned account holding the provided balance.
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    pub fn is_contract(&self) -> bool {
        self.code_hash != H256::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_is_not_a_contract() {
        assert!(!Account::default().is_contract());
        let contract = Account {
            code_hash: H256::repeat_byte(0x42),
            ..Account::default()
        };
        assert!(contract.is_contract());
    }
}
