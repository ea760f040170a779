use kiln_basic_types::{Address, BlockNumber, H256, U256};
use serde::{Deserialize, Serialize};

use crate::{Event, ExecutionStatus};

/// Receipt of a mined transaction, addressable by the transaction hash for as long as the
/// block that mined it has not been reverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    pub block_number: BlockNumber,
    pub from: Address,
    pub to: Address,
    pub status: ExecutionStatus,
    pub gas_used: U256,
    pub logs: Vec<Event>,
}
