//! Metrics of the checkpoint & revert engine.

use std::time::Duration;

use vise::{Buckets, Counter, Gauge, Histogram, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "kiln_state")]
pub(crate) struct StateMetrics {
    /// Number of checkpoints captured over the process lifetime.
    pub snapshots: Counter,
    /// Number of successful reverts.
    pub reverts: Counter,
    /// Latency of restoring the world state from a checkpoint.
    #[metrics(buckets = Buckets::LATENCIES)]
    pub revert_latency: Histogram<Duration>,
    /// Current depth of the checkpoint stack.
    pub checkpoint_stack_depth: Gauge<u64>,
    /// Receipts discarded by log truncation during reverts.
    pub truncated_receipts: Counter,
    /// Reads that found a values cache entry tagged with an outdated state generation.
    pub stale_values: Counter,
    /// Values cache sweeps caused by a state generation change.
    pub values_emptied: Counter,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<StateMetrics> = vise::Global::new();
