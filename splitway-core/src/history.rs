//! Bounded per-service history of routing decisions.

use std::collections::{BTreeMap, VecDeque};

use dashmap::DashMap;

use crate::domain::service::{Cluster, ServiceId};

/// Number of decisions retained per service.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// A single routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionRecord {
    /// Service the request was routed for.
    pub service: ServiceId,
    /// Cluster that was chosen.
    pub cluster: Cluster,
}

/// FIFO rings of the most recent decisions, one ring per service.
///
/// Each ring is guarded by its `DashMap` shard lock, which is held across
/// the append and the eviction so concurrent recorders never lose or
/// duplicate an entry.
#[derive(Debug)]
pub struct DecisionHistory {
    rings: DashMap<ServiceId, VecDeque<Cluster>>,
    capacity: usize,
}

impl DecisionHistory {
    /// Create an empty history with the default capacity of 10.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history retaining `capacity` decisions per service.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let rings = DashMap::with_capacity(ServiceId::COUNT);
        for service in ServiceId::ALL {
            rings.insert(service, VecDeque::with_capacity(capacity + 1));
        }
        Self { rings, capacity }
    }

    /// Maximum number of decisions kept per service.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a decision, evicting the single oldest entry when full.
    pub fn record(&self, record: DecisionRecord) {
        let mut ring = self.rings.entry(record.service).or_default();
        ring.push_back(record.cluster);
        if ring.len() > self.capacity {
            ring.pop_front();
        }
    }

    /// The retained decisions of `service`, oldest first.
    pub fn snapshot(&self, service: ServiceId) -> Vec<Cluster> {
        self.rings
            .get(&service)
            .map(|ring| ring.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Retained decisions of every service, keyed by service.
    pub fn snapshot_all(&self) -> BTreeMap<ServiceId, Vec<Cluster>> {
        ServiceId::ALL
            .into_iter()
            .map(|service| (service, self.snapshot(service)))
            .collect()
    }
}

impl Default for DecisionHistory {
    fn default() -> Self {
        Self::new()
    }
}
