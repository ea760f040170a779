use kiln_basic_types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};

/// Event emitted by a contract during transaction execution, reported as part of the
/// transaction receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub address: Address,
    pub indexed_topics: Vec<H256>,
    pub value: Bytes,
}
