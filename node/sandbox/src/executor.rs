//! The execution driver boundary.
//!
//! The engine does not interpret transactions itself: an implementation of
//! [`TransactionExecutor`] turns a transaction into account and storage writes, buffered in
//! a storage view owned by the node. The built-in [`TransferExecutor`] covers plain value
//! transfers; tests and embedders may plug their own executors for contract semantics.

use std::fmt;

use kiln_state::WriteStorage;
use kiln_types::{Event, ExecutionStatus, Nonce, Transaction, H256, U256};

/// Intrinsic gas cost of a plain value transfer.
pub const TRANSFER_GAS_COST: u64 = 21_000;

/// Errors rejecting a submitted transaction. A rejected transaction is not mined: it gets
/// no receipt and leaves no trace in the world state.
#[derive(Debug, thiserror::Error)]
pub enum SubmitTxError {
    #[error("nonce is incorrect: expected {expected}, got {actual}")]
    NonceMismatch { expected: Nonce, actual: Nonce },
    #[error("insufficient funds: balance {balance} is below the required {required}")]
    InsufficientFunds { balance: U256, required: U256 },
    #[error("gas limit {gas_limit} does not cover the intrinsic transaction cost")]
    GasLimitTooLow { gas_limit: U256 },
    #[error("transaction with hash {0:?} is already mined")]
    AlreadyKnown(H256),
}

/// Outcome of a single executed transaction. Storage and account writes are accumulated in
/// the storage view passed to the executor; the result carries everything else that ends up
/// in the receipt.
#[derive(Debug, Clone)]
pub struct TxExecutionResult {
    pub status: ExecutionStatus,
    pub gas_used: U256,
    pub events: Vec<Event>,
}

/// A transaction executor the sandbox node drives between checkpoints.
///
/// Executors write through the provided [`WriteStorage`] only; the node decides whether the
/// buffered writes are applied to the canonical stores. Returning an error rejects the
/// transaction without mining it.
pub trait TransactionExecutor: fmt::Debug {
    fn execute_tx(
        &mut self,
        tx: &Transaction,
        storage: &mut dyn WriteStorage,
    ) -> Result<TxExecutionResult, SubmitTxError>;
}

/// Built-in executor for plain value transfers: debits value plus the gas fee from the
/// initiator, bumps its nonce and credits the recipient.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl TransactionExecutor for TransferExecutor {
    fn execute_tx(
        &mut self,
        tx: &Transaction,
        storage: &mut dyn WriteStorage,
    ) -> Result<TxExecutionResult, SubmitTxError> {
        let mut initiator = storage.read_account(&tx.initiator);
        if initiator.nonce != tx.nonce {
            return Err(SubmitTxError::NonceMismatch {
                expected: initiator.nonce,
                actual: tx.nonce,
            });
        }
        if tx.fee.gas_limit < TRANSFER_GAS_COST.into() {
            return Err(SubmitTxError::GasLimitTooLow {
                gas_limit: tx.fee.gas_limit,
            });
        }
        // The initiator must afford the worst case up front, even though only the
        // intrinsic cost is charged below.
        let required = tx.value.saturating_add(tx.fee.max_total_fee());
        if initiator.balance < required {
            return Err(SubmitTxError::InsufficientFunds {
                balance: initiator.balance,
                required,
            });
        }

        let fee = U256::from(TRANSFER_GAS_COST) * tx.fee.gas_price;
        initiator.balance -= tx.value + fee;
        initiator.nonce = initiator.nonce + 1;
        storage.set_account(tx.initiator, initiator);

        // Read after the debit so self-transfers observe the debited state.
        let mut recipient = storage.read_account(&tx.to);
        recipient.balance += tx.value;
        storage.set_account(tx.to, recipient);

        Ok(TxExecutionResult {
            status: ExecutionStatus::Success,
            gas_used: TRANSFER_GAS_COST.into(),
            events: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use kiln_state::{StorageView, WorldState};
    use kiln_types::{Account, Address, Fee};

    use super::*;

    const GAS_PRICE: u64 = 20_000_000_000;

    fn transfer(value: u64, nonce: u32) -> Transaction {
        Transaction {
            initiator: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value: value.into(),
            fee: Fee::new(90_000, GAS_PRICE),
            nonce: Nonce(nonce),
        }
    }

    fn state_with_initiator_balance(balance: U256) -> WorldState {
        let mut state = WorldState::new(1 << 20);
        state
            .ledger_mut()
            .set(&Address::repeat_byte(0x01), Account::with_balance(balance));
        state
    }

    #[test]
    fn transfer_moves_value_and_charges_the_intrinsic_fee() {
        let state = state_with_initiator_balance(U256::exp10(18));
        let mut view = StorageView::new(&state);
        let tx = transfer(1_000, 0);

        let result = TransferExecutor.execute_tx(&tx, &mut view).unwrap();
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.gas_used, TRANSFER_GAS_COST.into());

        let fee = U256::from(TRANSFER_GAS_COST) * U256::from(GAS_PRICE);
        let initiator = view.modified_accounts()[&tx.initiator];
        assert_eq!(
            initiator.balance,
            U256::exp10(18) - U256::from(1_000) - fee
        );
        assert_eq!(initiator.nonce, Nonce(1));
        let recipient = view.modified_accounts()[&tx.to];
        assert_eq!(recipient.balance, U256::from(1_000));
    }

    #[test]
    fn nonce_mismatch_is_rejected() {
        let state = state_with_initiator_balance(U256::exp10(18));
        let mut view = StorageView::new(&state);

        let err = TransferExecutor.execute_tx(&transfer(1, 7), &mut view).unwrap_err();
        assert_matches!(
            err,
            SubmitTxError::NonceMismatch { expected: Nonce(0), actual: Nonce(7) }
        );
    }

    #[test]
    fn unaffordable_transfer_is_rejected() {
        let state = state_with_initiator_balance(U256::from(100));
        let mut view = StorageView::new(&state);

        let err = TransferExecutor.execute_tx(&transfer(1, 0), &mut view).unwrap_err();
        assert_matches!(
            err,
            SubmitTxError::InsufficientFunds { balance, .. } if balance == U256::from(100)
        );
        assert!(view.modified_accounts().is_empty());
    }

    #[test]
    fn too_low_gas_limit_is_rejected() {
        let state = state_with_initiator_balance(U256::exp10(18));
        let mut view = StorageView::new(&state);
        let mut tx = transfer(1, 0);
        tx.fee = Fee::new(TRANSFER_GAS_COST - 1, GAS_PRICE);

        let err = TransferExecutor.execute_tx(&tx, &mut view).unwrap_err();
        assert_matches!(err, SubmitTxError::GasLimitTooLow { .. });
    }

    #[test]
    fn self_transfer_only_burns_the_fee() {
        let state = state_with_initiator_balance(U256::exp10(18));
        let mut view = StorageView::new(&state);
        let mut tx = transfer(1_000, 0);
        tx.to = tx.initiator;

        TransferExecutor.execute_tx(&tx, &mut view).unwrap();
        let fee = U256::from(TRANSFER_GAS_COST) * U256::from(GAS_PRICE);
        let account = view.modified_accounts()[&tx.initiator];
        assert_eq!(account.balance, U256::exp10(18) - fee);
        assert_eq!(account.nonce, Nonce(1));
    }
}
