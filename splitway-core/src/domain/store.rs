//! Weight store holding the live routing-weight snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::weights_from_lookup;
use crate::domain::weights::WeightSnapshot;

/// A lock-free holder of the current [`WeightSnapshot`].
///
/// Uses `ArcSwap` so a refresh replaces the whole snapshot in one atomic
/// store; readers on the dispatch path never take a lock and always see
/// either the old or the new snapshot in full.
#[derive(Debug)]
pub struct WeightStore {
    current: ArcSwap<WeightSnapshot>,
}

impl WeightStore {
    /// Create a store seeded with `initial`.
    pub fn new(initial: WeightSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Seed the store from configuration variables resolved by `lookup`.
    ///
    /// Each service reads `<PREFIX>_CTX1_WEIGHT` and `<PREFIX>_CTX2_WEIGHT`;
    /// missing or invalid values fall back to the service baseline.
    pub fn initialize<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let snapshot = weights_from_lookup(lookup);
        tracing::info!(weights = ?snapshot, "traffic weights initialized");
        Self::new(snapshot)
    }

    /// Seed the store from the process environment.
    pub fn from_env() -> Self {
        Self::initialize(|key| std::env::var(key).ok())
    }

    /// The latest snapshot.
    pub fn current(&self) -> Arc<WeightSnapshot> {
        self.current.load_full()
    }

    /// Atomically replace the entire snapshot.
    pub fn replace(&self, snapshot: WeightSnapshot) -> Arc<WeightSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    /// Replace the snapshot with `f(current)`, retrying if another writer
    /// swapped it concurrently.
    pub fn update<F>(&self, f: F) -> Arc<WeightSnapshot>
    where
        F: Fn(&WeightSnapshot) -> WeightSnapshot,
    {
        let mut installed = None;
        self.current.rcu(|current| {
            let next = Arc::new(f(current));
            installed = Some(Arc::clone(&next));
            next
        });
        installed.unwrap_or_else(|| self.current())
    }
}

impl Default for WeightStore {
    fn default() -> Self {
        Self::new(WeightSnapshot::baseline())
    }
}

/// A shared reference to the weight store.
pub type SharedWeightStore = Arc<WeightStore>;
