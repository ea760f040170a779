//! Definitions of the most fundamental types used in the Kiln sandbox chain.

pub use kiln_basic_types::{
    web3, AccountTreeId, Address, BlockNumber, Bytes, ChainId, LogPosition, Nonce, SnapshotId,
    H160, H256, U128, U256, U64,
};

pub use self::{
    account::Account,
    bytecode::hash_bytecode,
    event::Event,
    fee::Fee,
    receipt::TransactionReceipt,
    storage::{
        hashed_address,
        log::{StorageLog, StorageLogKind},
        StorageKey, StorageValue,
    },
    tx::{ExecutionStatus, Transaction},
};

mod account;
mod bytecode;
mod event;
mod fee;
mod receipt;
pub mod storage;
mod tx;
