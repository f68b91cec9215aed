//! Logical service and cluster identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical backend capability served by replicas in both clusters.
///
/// The set is closed: every component iterates [`ServiceId::ALL`] instead of
/// matching on service names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    /// User accounts.
    User,
    /// Movie catalogue.
    Movie,
    /// Seat bookings.
    Booking,
}

impl ServiceId {
    /// Every logical service, in reporting order.
    pub const ALL: [ServiceId; 3] = [ServiceId::User, ServiceId::Movie, ServiceId::Booking];

    /// Number of logical services.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into per-service arrays.
    pub const fn index(self) -> usize {
        match self {
            ServiceId::User => 0,
            ServiceId::Movie => 1,
            ServiceId::Booking => 2,
        }
    }

    /// Short wire name (`user`, `movie`, `booking`).
    pub const fn as_str(self) -> &'static str {
        match self {
            ServiceId::User => "user",
            ServiceId::Movie => "movie",
            ServiceId::Booking => "booking",
        }
    }

    /// Kubernetes service name, e.g. `user-service`.
    pub const fn service_name(self) -> &'static str {
        match self {
            ServiceId::User => "user-service",
            ServiceId::Movie => "movie-service",
            ServiceId::Booking => "booking-service",
        }
    }

    /// Port the service listens on in every cluster.
    pub const fn port(self) -> u16 {
        match self {
            ServiceId::User => 8081,
            ServiceId::Movie => 8082,
            ServiceId::Booking => 8083,
        }
    }

    /// Icon shown by the dashboard.
    pub const fn icon(self) -> &'static str {
        match self {
            ServiceId::User => "👤",
            ServiceId::Movie => "🎬",
            ServiceId::Booking => "🎟️",
        }
    }

    /// Prefix of this service's environment variables, e.g. `USER_SERVICE`.
    pub const fn env_prefix(self) -> &'static str {
        match self {
            ServiceId::User => "USER_SERVICE",
            ServiceId::Movie => "MOVIE_SERVICE",
            ServiceId::Booking => "BOOKING_SERVICE",
        }
    }

    /// Baseline `(primary, secondary)` split used when nothing else is known.
    ///
    /// Deliberately asymmetric so both routing directions get exercised.
    pub const fn baseline_weights(self) -> (u32, u32) {
        match self {
            ServiceId::User => (70, 30),
            ServiceId::Movie => (30, 70),
            ServiceId::Booking => (50, 50),
        }
    }

    /// Name of the control-plane routing resource, e.g. `user-service-vs`.
    pub fn virtual_service_name(self) -> String {
        format!("{}-vs", self.service_name())
    }

    /// Topology node name of this service's replica in `cluster`.
    pub fn node_name(self, cluster: Cluster) -> String {
        format!("{}-{}", self.service_name(), cluster.label())
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two deployment targets a service's traffic is split between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cluster {
    /// The `ctx1` cluster, home of the gateway.
    #[serde(rename = "ctx1")]
    Primary,
    /// The `ctx2` cluster.
    #[serde(rename = "ctx2")]
    Secondary,
}

impl Cluster {
    /// Both clusters, primary first.
    pub const ALL: [Cluster; 2] = [Cluster::Primary, Cluster::Secondary];

    /// Subset label used by the control plane and the reporting API.
    pub const fn label(self) -> &'static str {
        match self {
            Cluster::Primary => "ctx1",
            Cluster::Secondary => "ctx2",
        }
    }

    /// Parses a subset label; anything but `ctx1`/`ctx2` is unknown.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ctx1" => Some(Cluster::Primary),
            "ctx2" => Some(Cluster::Secondary),
            _ => None,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_ordered() {
        for (i, service) in ServiceId::ALL.iter().enumerate() {
            assert_eq!(service.index(), i);
        }
    }

    #[test]
    fn resource_and_node_names() {
        assert_eq!(ServiceId::User.virtual_service_name(), "user-service-vs");
        assert_eq!(
            ServiceId::Booking.node_name(Cluster::Secondary),
            "booking-service-ctx2"
        );
    }

    #[test]
    fn cluster_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&[Cluster::Primary, Cluster::Secondary]).unwrap();
        assert_eq!(json, r#"["ctx1","ctx2"]"#);
        assert_eq!(Cluster::from_label("ctx2"), Some(Cluster::Secondary));
        assert_eq!(Cluster::from_label("canary"), None);
    }
}
