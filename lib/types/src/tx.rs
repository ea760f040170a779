use kiln_basic_types::{Address, ChainId, Nonce, H256, U256};
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::Fee;

/// Outcome of executing a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionStatus {
    Success,
    Failure,
}

/// A value-transfer transaction submitted to the sandbox.
///
/// Contract calls enter the sandbox through the same shape: the execution driver decides
/// what the payload means, the engine only cares about the initiator, the fee and the hash
/// under which the transaction is mined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub initiator: Address,
    pub to: Address,
    pub value: U256,
    pub fee: Fee,
    pub nonce: Nonce,
}

impl Transaction {
    /// Hash under which the transaction is mined and its receipt is addressable.
    ///
    /// Domain-separated by the chain id, so replaying the same transfer on another sandbox
    /// instance yields a different hash.
    pub fn hash(&self, chain_id: ChainId) -> H256 {
        let mut encoded = [0_u8; 144];
        encoded[..4].copy_from_slice(&chain_id.0.to_be_bytes());
        encoded[4..24].copy_from_slice(&self.initiator.to_fixed_bytes());
        encoded[24..44].copy_from_slice(&self.to.to_fixed_bytes());
        self.value.to_big_endian(&mut encoded[44..76]);
        encoded[76..80].copy_from_slice(&self.nonce.0.to_be_bytes());
        self.fee.gas_limit.to_big_endian(&mut encoded[80..112]);
        self.fee.gas_price.to_big_endian(&mut encoded[112..144]);

        let mut hasher = Keccak::v256();
        hasher.update(&encoded);
        let mut output = [0_u8; 32];
        hasher.finalize(&mut output);
        output.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(nonce: u32) -> Transaction {
        Transaction {
            initiator: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value: U256::from(1_000_000),
            fee: Fee::new(21_000, 20),
            nonce: Nonce(nonce),
        }
    }

    #[test]
    fn hash_depends_on_nonce_and_chain_id() {
        let chain_id = ChainId::default();
        assert_eq!(transfer(0).hash(chain_id), transfer(0).hash(chain_id));
        assert_ne!(transfer(0).hash(chain_id), transfer(1).hash(chain_id));
        assert_ne!(transfer(0).hash(chain_id), transfer(0).hash(ChainId(7)));
    }
}
