//! Ordered log of mined transactions and their receipts, indexed by transaction hash.

use std::collections::HashMap;

use kiln_types::{LogPosition, Transaction, TransactionReceipt, H256};

use crate::metrics::METRICS;

/// A mined transaction together with its receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLogEntry {
    pub transaction: Transaction,
    pub receipt: TransactionReceipt,
}

/// Append-only record of mined transactions. The only non-append mutation is
/// [`Self::truncate_to`], used by the checkpoint manager when a revert discards blocks.
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: Vec<TransactionLogEntry>,
    positions: HashMap<H256, LogPosition>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position right past the last entry; the next appended entry lands here.
    pub fn tail(&self) -> LogPosition {
        LogPosition(self.entries.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a mined transaction and returns the position it was mined at.
    pub fn append(&mut self, transaction: Transaction, receipt: TransactionReceipt) -> LogPosition {
        let position = self.tail();
        let hash = receipt.transaction_hash;
        debug_assert!(
            !self.positions.contains_key(&hash),
            "duplicate transaction hash {hash:?} in the log"
        );
        self.positions.insert(hash, position);
        self.entries.push(TransactionLogEntry {
            transaction,
            receipt,
        });
        position
    }

    pub fn contains(&self, hash: &H256) -> bool {
        self.positions.contains_key(hash)
    }

    pub fn entry_by_hash(&self, hash: &H256) -> Option<&TransactionLogEntry> {
        let position = self.positions.get(hash)?;
        self.entries.get(position.0 as usize)
    }

    pub fn receipt_by_hash(&self, hash: &H256) -> Option<&TransactionReceipt> {
        self.entry_by_hash(hash).map(|entry| &entry.receipt)
    }

    /// Discards every entry at or after `position`, both from the positional record and
    /// from the hash index. Returns the number of discarded entries.
    pub fn truncate_to(&mut self, position: LogPosition) -> usize {
        let truncated: Vec<_> = self.entries.drain(position.0 as usize..).collect();
        for entry in &truncated {
            self.positions.remove(&entry.receipt.transaction_hash);
        }
        METRICS.truncated_receipts.inc_by(truncated.len() as u64);
        truncated.len()
    }
}
