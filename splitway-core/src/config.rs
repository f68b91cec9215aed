//! Environment-sourced weight overrides.

use crate::domain::service::{Cluster, ServiceId};
use crate::domain::weights::{WeightPair, WeightSnapshot};

/// Largest weight an override may carry.
pub const MAX_WEIGHT: u32 = 100;

/// Name of the override variable for `service` in `cluster`,
/// e.g. `MOVIE_SERVICE_CTX2_WEIGHT`.
pub fn weight_var(service: ServiceId, cluster: Cluster) -> String {
    format!(
        "{}_{}_WEIGHT",
        service.env_prefix(),
        cluster.label().to_ascii_uppercase()
    )
}

/// Build a snapshot from the six weight variables resolved by `lookup`.
pub fn weights_from_lookup<F>(lookup: F) -> WeightSnapshot
where
    F: Fn(&str) -> Option<String>,
{
    WeightSnapshot::from_fn(|service| {
        let baseline = WeightPair::baseline(service);
        let read = |cluster: Cluster| {
            let key = weight_var(service, cluster);
            let default = baseline.weight(cluster);
            match lookup(&key) {
                Some(raw) => parse_weight(&key, &raw).unwrap_or(default),
                None => default,
            }
        };
        WeightPair::new(service, read(Cluster::Primary), read(Cluster::Secondary))
    })
}

fn parse_weight(key: &str, raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(weight) if weight <= MAX_WEIGHT => Some(weight),
        Ok(weight) => {
            tracing::warn!(%key, weight, "weight above {MAX_WEIGHT}, using default");
            None
        }
        Err(err) => {
            tracing::warn!(%key, value = %raw, %err, "invalid weight, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot(vars: &[(&str, &str)]) -> WeightSnapshot {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        weights_from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn variable_names() {
        assert_eq!(weight_var(ServiceId::User, Cluster::Primary), "USER_SERVICE_CTX1_WEIGHT");
        assert_eq!(
            weight_var(ServiceId::Booking, Cluster::Secondary),
            "BOOKING_SERVICE_CTX2_WEIGHT"
        );
    }

    #[test]
    fn absent_variables_use_baseline() {
        assert_eq!(snapshot(&[]), WeightSnapshot::baseline());
    }

    #[test]
    fn overrides_apply_per_cluster() {
        let weights = snapshot(&[
            ("MOVIE_SERVICE_CTX1_WEIGHT", "100"),
            ("MOVIE_SERVICE_CTX2_WEIGHT", " 0 "),
        ]);
        assert_eq!(
            weights.get(ServiceId::Movie),
            WeightPair::new(ServiceId::Movie, 100, 0)
        );
    }

    #[test]
    fn invalid_values_fall_back_individually() {
        let weights = snapshot(&[
            ("USER_SERVICE_CTX1_WEIGHT", "lots"),
            ("USER_SERVICE_CTX2_WEIGHT", "40"),
            ("BOOKING_SERVICE_CTX1_WEIGHT", "101"),
            ("BOOKING_SERVICE_CTX2_WEIGHT", "-5"),
        ]);
        assert_eq!(weights.get(ServiceId::User), WeightPair::new(ServiceId::User, 70, 40));
        assert_eq!(weights.get(ServiceId::Booking), WeightPair::baseline(ServiceId::Booking));
    }
}
