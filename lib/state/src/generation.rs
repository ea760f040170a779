use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Value of the state generation counter at some instant. Cache entries carry the
/// generation at which they were populated; an entry whose generation does not match the
/// live counter must be treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared, monotonically increasing state generation counter.
///
/// There is exactly one counter per [`WorldState`](crate::WorldState); every store and
/// every cache layered above it holds a clone. Restoring any store bumps the counter, which
/// structurally invalidates all generation-tagged cache entries at once. No cache is ever
/// cleared explicitly on revert.
#[derive(Debug, Clone, Default)]
pub struct StateGeneration(Arc<AtomicU64>);

impl StateGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::Acquire))
    }

    /// Advances the counter and returns the new generation.
    pub fn bump(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_is_visible_through_clones() {
        let generation = StateGeneration::new();
        let clone = generation.clone();
        assert_eq!(clone.current(), Generation(0));

        let bumped = generation.bump();
        assert_eq!(bumped, Generation(1));
        assert_eq!(clone.current(), Generation(1));
    }
}
