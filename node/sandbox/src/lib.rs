//! Kiln single-node sandbox.
//!
//! Drives transaction execution against the checkpointable world state of
//! [`kiln_state`] and exposes the control surface an external RPC layer consumes:
//! snapshot/revert, balances, nonces, storage slots and transaction receipts.

// Linter settings.
#![warn(missing_debug_implementations, bare_trait_objects)]

pub use self::{
    config::SandboxConfig,
    executor::{
        SubmitTxError, TransactionExecutor, TransferExecutor, TxExecutionResult,
        TRANSFER_GAS_COST,
    },
    node::SandboxNode,
};

mod config;
mod executor;
mod metrics;
mod node;
