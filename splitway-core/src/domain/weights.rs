//! Weight pairs and whole-deployment weight snapshots.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::service::{Cluster, ServiceId};

/// Immutable traffic split of one logical service between its two clusters.
///
/// Weights are relative; they need not sum to 100 and may both be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightPair {
    /// The service this split applies to.
    #[serde(skip_serializing)]
    pub service: ServiceId,
    /// Weight of the `ctx1` replica.
    #[serde(rename = "ctx1")]
    pub primary: u32,
    /// Weight of the `ctx2` replica.
    #[serde(rename = "ctx2")]
    pub secondary: u32,
}

impl WeightPair {
    /// Create a new weight pair.
    pub const fn new(service: ServiceId, primary: u32, secondary: u32) -> Self {
        Self {
            service,
            primary,
            secondary,
        }
    }

    /// The baseline split of `service`.
    pub const fn baseline(service: ServiceId) -> Self {
        let (primary, secondary) = service.baseline_weights();
        Self::new(service, primary, secondary)
    }

    /// Weight advertised for `cluster`.
    pub const fn weight(&self, cluster: Cluster) -> u32 {
        match cluster {
            Cluster::Primary => self.primary,
            Cluster::Secondary => self.secondary,
        }
    }

    /// Sum of both weights, widened so it cannot overflow.
    pub const fn total(&self) -> u64 {
        self.primary as u64 + self.secondary as u64
    }
}

/// A complete set of weight pairs, exactly one per [`ServiceId`].
///
/// Snapshots are never edited in place; a refresh builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightSnapshot {
    pairs: [WeightPair; ServiceId::COUNT],
}

impl WeightSnapshot {
    /// Build a snapshot by asking `pair_for` about every service.
    ///
    /// The service stored in each returned pair is normalised to the key it
    /// was requested for.
    pub fn from_fn(mut pair_for: impl FnMut(ServiceId) -> WeightPair) -> Self {
        let pairs = ServiceId::ALL.map(|service| {
            let pair = pair_for(service);
            WeightPair::new(service, pair.primary, pair.secondary)
        });
        Self { pairs }
    }

    /// The baseline snapshot (user 70/30, movie 30/70, booking 50/50).
    pub fn baseline() -> Self {
        Self::from_fn(WeightPair::baseline)
    }

    /// Weight pair of `service`.
    pub fn get(&self, service: ServiceId) -> WeightPair {
        self.pairs[service.index()]
    }

    /// A copy of this snapshot with `service`'s pair replaced.
    pub fn with_pair(&self, pair: WeightPair) -> Self {
        let mut pairs = self.pairs;
        pairs[pair.service.index()] = pair;
        Self { pairs }
    }

    /// Iterate over all pairs in [`ServiceId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &WeightPair> {
        self.pairs.iter()
    }
}

impl Serialize for WeightSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ServiceId::COUNT))?;
        for pair in &self.pairs {
            map.serialize_entry(pair.service.as_str(), pair)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_asymmetric() {
        let snapshot = WeightSnapshot::baseline();
        assert_eq!(snapshot.get(ServiceId::User), WeightPair::new(ServiceId::User, 70, 30));
        assert_eq!(snapshot.get(ServiceId::Movie), WeightPair::new(ServiceId::Movie, 30, 70));
        assert_eq!(
            snapshot.get(ServiceId::Booking),
            WeightPair::new(ServiceId::Booking, 50, 50)
        );
    }

    #[test]
    fn from_fn_normalises_service_keys() {
        let snapshot = WeightSnapshot::from_fn(|_| WeightPair::new(ServiceId::User, 1, 2));
        for service in ServiceId::ALL {
            assert_eq!(snapshot.get(service).service, service);
        }
    }

    #[test]
    fn with_pair_leaves_original_untouched() {
        let original = WeightSnapshot::baseline();
        let updated = original.with_pair(WeightPair::new(ServiceId::Movie, 100, 0));
        assert_eq!(original.get(ServiceId::Movie).primary, 30);
        assert_eq!(updated.get(ServiceId::Movie).primary, 100);
        assert_eq!(updated.get(ServiceId::User), original.get(ServiceId::User));
    }

    #[test]
    fn total_does_not_overflow() {
        let pair = WeightPair::new(ServiceId::User, u32::MAX, u32::MAX);
        assert_eq!(pair.total(), 2 * u32::MAX as u64);
    }

    #[test]
    fn serializes_one_object_per_service() {
        let json = serde_json::to_value(WeightSnapshot::baseline()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user": {"ctx1": 70, "ctx2": 30},
                "movie": {"ctx1": 30, "ctx2": 70},
                "booking": {"ctx1": 50, "ctx2": 50},
            })
        );
    }
}
