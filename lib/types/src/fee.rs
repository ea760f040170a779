use kiln_basic_types::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    /// The maximal amount of gas the initiator is willing to spend on the transaction.
    pub gas_limit: U256,
    /// Price (in wei) the initiator pays per unit of gas.
    pub gas_price: U256,
}

impl Fee {
    pub fn new(gas_limit: u64, gas_price: u64) -> Self {
        Self {
            gas_limit: gas_limit.into(),
            gas_price: gas_price.into(),
        }
    }

    /// Upper bound on the fee charged for the transaction. The initiator must be able to
    /// afford this bound up front even if the actual gas usage ends up lower.
    pub fn max_total_fee(&self) -> U256 {
        self.gas_limit * self.gas_price
    }
}
