//! The sandbox node: owns the world state and linearizes execution with the checkpoint
//! control operations.

use std::sync::{Mutex, MutexGuard};

use kiln_state::{CheckpointError, CheckpointManager, StorageView, WorldState};
use kiln_types::{
    Account, AccountTreeId, Address, BlockNumber, ChainId, Nonce, SnapshotId, StorageKey,
    Transaction, TransactionReceipt, H256, U256,
};
use tiny_keccak::{Hasher, Keccak};

use crate::{
    config::SandboxConfig,
    executor::{SubmitTxError, TransactionExecutor, TransferExecutor},
    metrics::METRICS,
};

/// A single-node sandbox chain.
///
/// One mutex guards the world state, the checkpoint stack and the executor as a unit:
/// transaction execution, `snapshot` and `revert_snapshot` are linearized with respect to
/// each other (single logical writer), and the lock is held for at most one transaction or
/// one restore. An external RPC layer maps its `evm_snapshot` / `evm_revert` /
/// `eth_getBalance` / `eth_getTransactionReceipt` handlers directly onto the methods here.
#[derive(Debug)]
pub struct SandboxNode {
    inner: Mutex<SandboxInner>,
    chain_id: ChainId,
    dev_accounts: Vec<Address>,
}

#[derive(Debug)]
struct SandboxInner {
    state: WorldState,
    checkpoints: CheckpointManager,
    executor: TransferExecutor,
}

impl SandboxNode {
    pub fn new(config: &SandboxConfig) -> Self {
        let mut state = WorldState::new(config.values_cache_capacity);
        let dev_accounts: Vec<_> = (0..config.dev_accounts).map(dev_account_address).collect();
        let funding = config.dev_balance_wei();
        for address in &dev_accounts {
            state.ledger_mut().set(address, Account::with_balance(funding));
        }
        tracing::info!(
            "Started sandbox chain {}: funded {} dev account(s) with {funding} wei each",
            config.chain_id,
            dev_accounts.len()
        );

        Self {
            inner: Mutex::new(SandboxInner {
                state,
                checkpoints: CheckpointManager::new(),
                executor: TransferExecutor,
            }),
            chain_id: ChainId(config.chain_id),
            dev_accounts,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Addresses funded at genesis, in derivation order.
    pub fn dev_accounts(&self) -> &[Address] {
        &self.dev_accounts
    }

    /// Executes a transaction with the built-in transfer executor, instamining it into its
    /// own block.
    pub fn execute_transaction(
        &self,
        tx: Transaction,
    ) -> Result<TransactionReceipt, SubmitTxError> {
        let mut guard = self.lock();
        let SandboxInner {
            state, executor, ..
        } = &mut *guard;
        execute_inner(self.chain_id, state, executor, tx)
    }

    /// Executes a transaction with a caller-provided executor. This is the seam for
    /// contract semantics: the executor reads and writes through the node's storage view
    /// and the node mines the result exactly like a built-in transfer.
    pub fn execute_transaction_with(
        &self,
        tx: Transaction,
        executor: &mut dyn TransactionExecutor,
    ) -> Result<TransactionReceipt, SubmitTxError> {
        let mut guard = self.lock();
        execute_inner(self.chain_id, &mut guard.state, executor, tx)
    }

    /// Captures a checkpoint of the current world state and returns its id.
    pub fn snapshot(&self) -> SnapshotId {
        let mut guard = self.lock();
        let SandboxInner {
            state, checkpoints, ..
        } = &mut *guard;
        checkpoints.snapshot(state)
    }

    /// Reverts the world state to the checkpoint `id`, discarding every later mutation,
    /// block and checkpoint. An RPC boundary maps `Ok` to `true` and
    /// [`CheckpointError::UnknownCheckpoint`] to `false`.
    pub fn revert_snapshot(&self, id: SnapshotId) -> Result<(), CheckpointError> {
        let mut guard = self.lock();
        let SandboxInner {
            state, checkpoints, ..
        } = &mut *guard;
        let result = checkpoints.revert(state, id);
        if result.is_ok() {
            METRICS.block_number.set(u64::from(state.block_number().0));
        }
        result
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.lock().state.ledger().get(address).balance
    }

    pub fn nonce(&self, address: &Address) -> Nonce {
        self.lock().state.ledger().get(address).nonce
    }

    /// Reads a contract storage slot through the working cache.
    pub fn storage_at(&self, address: Address, key: H256) -> H256 {
        let key = StorageKey::new(AccountTreeId::new(address), key);
        self.lock().state.storage().read_slot(&key)
    }

    /// Receipt of a mined transaction, or `None` if the hash is unknown (including hashes
    /// discarded by a revert).
    pub fn transaction_receipt(&self, hash: &H256) -> Option<TransactionReceipt> {
        self.lock().state.tx_log().receipt_by_hash(hash).cloned()
    }

    pub fn block_number(&self) -> BlockNumber {
        self.lock().state.block_number()
    }

    fn lock(&self) -> MutexGuard<'_, SandboxInner> {
        self.inner.lock().expect("sandbox state is poisoned")
    }
}

fn execute_inner(
    chain_id: ChainId,
    state: &mut WorldState,
    executor: &mut dyn TransactionExecutor,
    tx: Transaction,
) -> Result<TransactionReceipt, SubmitTxError> {
    let hash = tx.hash(chain_id);
    let result = (|| {
        if state.tx_log().contains(&hash) {
            return Err(SubmitTxError::AlreadyKnown(hash));
        }
        let mut view = StorageView::new(&*state);
        let result = executor.execute_tx(&tx, &mut view)?;
        Ok((view.into_modifications(), result))
    })();
    let (modifications, result) = result.inspect_err(|err| {
        METRICS.rejected_transactions.inc();
        tracing::debug!("Rejected transaction {hash:?}: {err}");
    })?;

    state.apply(modifications);
    let block_number = state.seal_block();
    let receipt = TransactionReceipt {
        transaction_hash: hash,
        block_number,
        from: tx.initiator,
        to: tx.to,
        status: result.status,
        gas_used: result.gas_used,
        logs: result.events,
    };
    state.tx_log_mut().append(tx, receipt.clone());

    METRICS.executed_transactions.inc();
    METRICS.block_number.set(u64::from(block_number.0));
    tracing::debug!("Mined transaction {hash:?} in block {block_number}");
    Ok(receipt)
}

/// Deterministic dev account derivation, so sandbox restarts fund the same addresses.
fn dev_account_address(index: usize) -> Address {
    let mut hasher = Keccak::v256();
    hasher.update(b"kiln dev account");
    hasher.update(&(index as u32).to_be_bytes());
    let mut output = [0_u8; 32];
    hasher.finalize(&mut output);
    Address::from_slice(&output[12..])
}
