//! Metrics of the sandbox node.

use vise::{Counter, Gauge, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "kiln_sandbox")]
pub(crate) struct SandboxMetrics {
    /// Number of successfully mined transactions.
    pub executed_transactions: Counter,
    /// Number of transactions rejected during validation or execution.
    pub rejected_transactions: Counter,
    /// Current chain height.
    pub block_number: Gauge<u64>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<SandboxMetrics> = vise::Global::new();
