//! Named checkpoints of the world state and the revert protocol.

use std::time::Instant;

use kiln_types::{BlockNumber, LogPosition, SnapshotId};

use crate::{
    contract_storage::StorageHandle, ledger::LedgerHandle, metrics::METRICS, world::WorldState,
};

/// Errors of the checkpoint control operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// The revert target is not on the checkpoint stack: it was either never issued or
    /// already discarded by an earlier revert. The world state is left untouched.
    #[error("unknown checkpoint {0}: never issued or already reverted past")]
    UnknownCheckpoint(SnapshotId),
    /// The world state mutated in a way that contradicts the checkpoint stack (e.g. the
    /// transaction log shrank below a captured tail without a revert). This cannot happen
    /// while all mutations go through the single state lock; detecting it means a
    /// programming error, and the operation is aborted without touching state.
    #[error("world state mutated concurrently with a checkpoint operation")]
    Conflict,
}

/// Immutable, point-in-time capture of the world state.
///
/// Holds the captured page-table roots of the ledger and the storage store (structural
/// sharing: capturing does not copy store contents) plus the positions of the log tail and
/// block height. Owned exclusively by the [`CheckpointManager`] stack.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: SnapshotId,
    ledger: LedgerHandle,
    storage: StorageHandle,
    log_tail: LogPosition,
    block_number: BlockNumber,
}

impl Snapshot {
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub(crate) fn ledger_handle(&self) -> &LedgerHandle {
        &self.ledger
    }

    pub(crate) fn storage_handle(&self) -> &StorageHandle {
        &self.storage
    }

    pub(crate) fn log_tail(&self) -> LogPosition {
        self.log_tail
    }

    pub(crate) fn block_number(&self) -> BlockNumber {
        self.block_number
    }
}

/// Owner of the checkpoint stack.
///
/// The stack is push-only except for [`Self::revert`], which pops the revert target and
/// every snapshot above it. Ids are allocated from a process-lifetime monotonic counter and
/// are never reused, so a discarded id can never be confused with a fresh one.
#[derive(Debug)]
pub struct CheckpointManager {
    stack: Vec<Snapshot>,
    next_id: SnapshotId,
}

impl Default for CheckpointManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointManager {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            // Id space starts at 1, so a zero id always reads as "never issued".
            next_id: SnapshotId(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Freezes the current world state into a new checkpoint and returns its id.
    ///
    /// Pure capture: existing state is not touched, and capturing is O(1) in the store
    /// size. Checkpoints are never deduplicated; snapshotting twice without intervening
    /// mutations yields two distinct ids.
    pub fn snapshot(&mut self, state: &WorldState) -> SnapshotId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.stack.push(Snapshot {
            id,
            ledger: state.ledger().capture(),
            storage: state.storage().capture(),
            log_tail: state.tx_log().tail(),
            block_number: state.block_number(),
        });

        METRICS.snapshots.inc();
        METRICS.checkpoint_stack_depth.set(self.stack.len() as u64);
        tracing::debug!(
            "Captured checkpoint {id} at block {}, log tail {}",
            state.block_number(),
            state.tx_log().tail()
        );
        id
    }

    /// Restores the world state to checkpoint `id`, discarding every mutation and every
    /// checkpoint made after it was captured.
    ///
    /// All validation happens before the first mutation, so a failed revert leaves the
    /// stack and the stores exactly as they were.
    pub fn revert(&mut self, state: &mut WorldState, id: SnapshotId) -> Result<(), CheckpointError> {
        let started_at = Instant::now();
        let position = self
            .stack
            .iter()
            .position(|snapshot| snapshot.id() == id)
            .ok_or(CheckpointError::UnknownCheckpoint(id))?;
        let snapshot = &self.stack[position];
        if state.tx_log().tail() < snapshot.log_tail() {
            return Err(CheckpointError::Conflict);
        }

        state.rollback_to(snapshot);
        let discarded = self.stack.len() - position;
        self.stack.truncate(position);

        METRICS.reverts.inc();
        METRICS.checkpoint_stack_depth.set(self.stack.len() as u64);
        METRICS.revert_latency.observe(started_at.elapsed());
        tracing::debug!(
            "Reverted to checkpoint {id}: discarded {discarded} checkpoint(s), \
             world state is back at block {}",
            state.block_number()
        );
        Ok(())
    }
}
