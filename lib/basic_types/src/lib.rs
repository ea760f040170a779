//! The declaration of the most primitive types used in the Kiln sandbox chain.
//!
//! Most of them are just re-exported from the `web3` crate.

#[macro_use]
mod macros;

use std::{
    fmt,
    num::ParseIntError,
    ops::{Add, Deref, DerefMut, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

pub use web3;
pub use web3::types::{Address, Bytes, H160, H256, U128, U256, U64};

/// Account place in the global state tree is uniquely identified by its address.
/// In binary form this type is represented by the 160-bit big-endian representation
/// of the account address.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Hash, Ord, PartialOrd)]
pub struct AccountTreeId {
    address: Address,
}

impl AccountTreeId {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    #[allow(clippy::wrong_self_convention)] // In that case, reference makes more sense.
    pub fn to_fixed_bytes(&self) -> [u8; 20] {
        let mut result = [0u8; 20];
        result.copy_from_slice(&self.address.to_fixed_bytes());
        result
    }

    pub fn from_fixed_bytes(value: [u8; 20]) -> Self {
        let address = Address::from_slice(&value);
        Self { address }
    }
}

impl Default for AccountTreeId {
    fn default() -> Self {
        Self {
            address: Address::zero(),
        }
    }
}

basic_type!(
    /// Sandbox chain block sequential index.
    BlockNumber,
    u32
);

basic_type!(
    /// Sandbox chain account nonce.
    Nonce,
    u32
);

basic_type!(
    /// ChainId of the sandbox chain network.
    ChainId,
    u32
);

basic_type!(
    /// Identifier of a world-state checkpoint, allocated by the checkpoint manager.
    SnapshotId,
    u64
);

basic_type!(
    /// Position of an entry in the transaction/receipt log.
    LogPosition,
    u64
);

#[allow(clippy::derivable_impls)]
impl Default for BlockNumber {
    fn default() -> Self {
        Self(0)
    }
}

#[allow(clippy::derivable_impls)]
impl Default for Nonce {
    fn default() -> Self {
        Self(0)
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self(1337)
    }
}

#[allow(clippy::derivable_impls)]
impl Default for LogPosition {
    fn default() -> Self {
        Self(0)
    }
}
