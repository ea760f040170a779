//! Metrics shared by all working caches.

use vise::{Counter, EncodeLabelValue, Gauge, LabeledFamily, Metrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(super) enum RequestOutcome {
    Hit,
    Miss,
}

impl RequestOutcome {
    pub fn from_hit(hit: bool) -> Self {
        if hit {
            Self::Hit
        } else {
            Self::Miss
        }
    }
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "kiln_state_cache")]
pub(super) struct CacheMetrics {
    /// Counter of hits / misses for a cache.
    #[metrics(labels = ["name", "kind"])]
    pub requests: LabeledFamily<(&'static str, RequestOutcome), Counter, 2>,
    /// Number of entries in the cache.
    #[metrics(labels = ["name"])]
    pub len: LabeledFamily<&'static str, Gauge<u64>>,
    /// Approximate memory usage of the cache.
    #[metrics(labels = ["name"])]
    pub used_memory: LabeledFamily<&'static str, Gauge<u64>>,
}

#[vise::register]
pub(super) static METRICS: vise::Global<CacheMetrics> = vise::Global::new();
