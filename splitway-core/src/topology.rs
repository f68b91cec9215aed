//! Multi-cluster topology and traffic-flow view.
//!
//! The inventory is static; traffic-flow edges are derived from a weight
//! snapshot every time a topology is built and are never stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::service::{Cluster, ServiceId};
use crate::domain::weights::WeightSnapshot;

/// Descriptive metadata of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNode {
    /// Cluster label (`ctx1`, `ctx2`).
    pub name: String,
    /// Hosting provider.
    #[serde(rename = "provider")]
    pub provider_label: String,
    /// Operational status as reported to the dashboard.
    pub status: String,
    /// Number of worker nodes.
    pub node_count: u32,
}

/// Where a deployable is placed, per cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDeployment {
    /// Deployment name.
    pub name: String,
    /// Dashboard icon.
    pub icon: String,
    /// Listening port.
    pub port: String,
    /// Cluster label to deployment identifier.
    #[serde(rename = "deployments")]
    pub deployments_by_cluster: BTreeMap<String, String>,
}

/// Kind of hop an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowType {
    /// Traffic entering the mesh.
    External,
    /// Traffic staying inside one cluster.
    Internal,
    /// Traffic crossing from one cluster to the other.
    CrossCluster,
}

/// A weighted hop in the traffic-flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficFlowEdge {
    /// Source node.
    pub from: String,
    /// Destination node.
    pub to: String,
    /// Relative weight carried by this hop.
    pub weight: u32,
    /// Whether any traffic flows; always `weight > 0`.
    pub is_active: bool,
    /// Kind of hop.
    pub flow_type: FlowType,
}

impl TrafficFlowEdge {
    /// Create an edge whose activity is derived from `weight`.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        weight: u32,
        flow_type: FlowType,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            weight,
            is_active: weight > 0,
            flow_type,
        }
    }
}

/// A rendered topology report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    /// Cluster inventory.
    pub clusters: Vec<ClusterNode>,
    /// Service placement inventory.
    pub services: Vec<ServiceDeployment>,
    /// Derived traffic-flow edges.
    pub traffic_flow: Vec<TrafficFlowEdge>,
    /// When this report was generated.
    pub last_updated: DateTime<Utc>,
}

/// The static skeleton a [`Topology`] is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyInventory {
    /// Cluster inventory.
    pub clusters: Vec<ClusterNode>,
    /// Service placement inventory.
    pub services: Vec<ServiceDeployment>,
    /// Node name of the gateway that receives external traffic.
    pub gateway_node: String,
    /// Optional east-west relay every cross-cluster leg passes through.
    pub relay_node: Option<String>,
}

impl TopologyInventory {
    /// The theater deployment: the gateway and redis in `ctx1`, every
    /// logical service replicated in both clusters.
    pub fn standard() -> Self {
        let cluster = |name: &str, provider: &str| ClusterNode {
            name: name.to_string(),
            provider_label: provider.to_string(),
            status: "Active".to_string(),
            node_count: 1,
        };
        let single = |name: &str, icon: &str, port: &str| ServiceDeployment {
            name: name.to_string(),
            icon: icon.to_string(),
            port: port.to_string(),
            deployments_by_cluster: BTreeMap::from([(
                Cluster::Primary.label().to_string(),
                format!("{name}-xxx"),
            )]),
        };

        let mut services = vec![single("api-gateway", "🌐", "8080")];
        services.extend(ServiceId::ALL.into_iter().map(|service| ServiceDeployment {
            name: service.service_name().to_string(),
            icon: service.icon().to_string(),
            port: service.port().to_string(),
            deployments_by_cluster: Cluster::ALL
                .into_iter()
                .map(|c| (c.label().to_string(), format!("{}-xxx", service.node_name(c))))
                .collect(),
        }));
        services.push(single("redis", "💾", "6379"));

        Self {
            clusters: vec![
                cluster(Cluster::Primary.label(), "NaverCloud Platform"),
                cluster(Cluster::Secondary.label(), "NHN Cloud NKS"),
            ],
            services,
            gateway_node: format!("api-gateway-{}", Cluster::Primary.label()),
            relay_node: None,
        }
    }

    /// Route every cross-cluster leg through `relay`.
    pub fn with_relay(mut self, relay: impl Into<String>) -> Self {
        self.relay_node = Some(relay.into());
        self
    }

    /// Render the topology for `weights` at `generated_at`.
    pub fn build(&self, weights: &WeightSnapshot, generated_at: DateTime<Utc>) -> Topology {
        Topology {
            clusters: self.clusters.clone(),
            services: self.services.clone(),
            traffic_flow: self.traffic_flow(weights),
            last_updated: generated_at,
        }
    }

    /// Derive the traffic-flow edges for `weights`.
    pub fn traffic_flow(&self, weights: &WeightSnapshot) -> Vec<TrafficFlowEdge> {
        let gateway = self.gateway_node.as_str();
        let mut edges = vec![TrafficFlowEdge::new("external", gateway, 100, FlowType::External)];

        for pair in weights.iter() {
            edges.push(TrafficFlowEdge::new(
                gateway,
                pair.service.node_name(Cluster::Primary),
                pair.primary,
                FlowType::Internal,
            ));
            if self.relay_node.is_none() {
                edges.push(TrafficFlowEdge::new(
                    gateway,
                    pair.service.node_name(Cluster::Secondary),
                    pair.secondary,
                    FlowType::CrossCluster,
                ));
            }
        }

        if let Some(relay) = &self.relay_node {
            let relayed = weights
                .iter()
                .fold(0u32, |sum, pair| sum.saturating_add(pair.secondary));
            edges.push(TrafficFlowEdge::new(
                gateway,
                relay.as_str(),
                relayed,
                FlowType::CrossCluster,
            ));
            edges.extend(weights.iter().map(|pair| {
                TrafficFlowEdge::new(
                    relay.as_str(),
                    pair.service.node_name(Cluster::Secondary),
                    pair.secondary,
                    FlowType::Internal,
                )
            }));
        }

        edges
    }
}

impl Default for TopologyInventory {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weights::WeightPair;
    use chrono::TimeZone;

    fn edge<'a>(edges: &'a [TrafficFlowEdge], from: &str, to: &str) -> &'a TrafficFlowEdge {
        edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .unwrap_or_else(|| panic!("missing edge {from} -> {to}"))
    }

    #[test]
    fn secondary_edge_activity_follows_weight() {
        let inventory = TopologyInventory::standard();
        let weights =
            WeightSnapshot::baseline().with_pair(WeightPair::new(ServiceId::Movie, 100, 0));
        let edges = inventory.traffic_flow(&weights);

        let user = edge(&edges, "api-gateway-ctx1", "user-service-ctx2");
        assert_eq!(user.weight, 30);
        assert!(user.is_active);
        assert_eq!(user.flow_type, FlowType::CrossCluster);

        let movie = edge(&edges, "api-gateway-ctx1", "movie-service-ctx2");
        assert_eq!(movie.weight, 0);
        assert!(!movie.is_active);

        let movie_local = edge(&edges, "api-gateway-ctx1", "movie-service-ctx1");
        assert_eq!(movie_local.flow_type, FlowType::Internal);
        assert!(movie_local.is_active);
    }

    #[test]
    fn standard_inventory_has_one_ingress_and_two_legs_per_service() {
        let edges = TopologyInventory::standard().traffic_flow(&WeightSnapshot::baseline());
        assert_eq!(edges.len(), 1 + 2 * ServiceId::COUNT);
        let ingress = edge(&edges, "external", "api-gateway-ctx1");
        assert_eq!((ingress.weight, ingress.flow_type), (100, FlowType::External));
    }

    #[test]
    fn relay_carries_the_sum_of_cross_cluster_weights() {
        let inventory = TopologyInventory::standard().with_relay("eastwest-gateway-ctx2");
        let edges = inventory.traffic_flow(&WeightSnapshot::baseline());

        let relay = edge(&edges, "api-gateway-ctx1", "eastwest-gateway-ctx2");
        assert_eq!(relay.weight, 30 + 70 + 50);
        assert_eq!(relay.flow_type, FlowType::CrossCluster);
        let bypasses_relay = |e: &TrafficFlowEdge| {
            e.from == "api-gateway-ctx1"
                && e.to.ends_with("-ctx2")
                && e.to != "eastwest-gateway-ctx2"
        };
        assert!(!edges.iter().any(bypasses_relay));
        assert_eq!(
            edge(&edges, "eastwest-gateway-ctx2", "booking-service-ctx2").weight,
            50
        );
    }

    #[test]
    fn relay_is_inactive_when_nothing_crosses() {
        let inventory = TopologyInventory::standard().with_relay("eastwest-gateway-ctx2");
        let weights = WeightSnapshot::from_fn(|s| WeightPair::new(s, 100, 0));
        let edges = inventory.traffic_flow(&weights);
        assert!(!edge(&edges, "api-gateway-ctx1", "eastwest-gateway-ctx2").is_active);
    }

    #[test]
    fn serializes_dashboard_shape() {
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let topology = TopologyInventory::standard().build(&WeightSnapshot::baseline(), at);
        let json = serde_json::to_value(&topology).unwrap();

        assert_eq!(json["clusters"][1]["provider"], "NHN Cloud NKS");
        assert_eq!(json["clusters"][0]["nodeCount"], 1);
        assert_eq!(json["services"][1]["deployments"]["ctx2"], "user-service-ctx2-xxx");
        assert_eq!(json["trafficFlow"][2]["flowType"], "cross-cluster");
        assert_eq!(json["trafficFlow"][2]["isActive"], true);
        assert_eq!(json["lastUpdated"], "2026-10-14T12:00:00Z");
        assert_eq!(json["services"].as_array().unwrap().len(), 5);
    }
}
