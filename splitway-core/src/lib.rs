//! Splitway Core functionality.
//!
//! This crate contains the domain models and traffic-distribution primitives
//! that power the Splitway gateway: the weight store, the weighted selector,
//! the decision history ring and the topology builder.

pub mod config;
pub mod domain;
pub mod history;
pub mod load_balancer;
pub mod topology;

pub use domain::service::{Cluster, ServiceId};
pub use domain::store::{SharedWeightStore, WeightStore};
pub use domain::weights::{WeightPair, WeightSnapshot};
pub use history::{DecisionHistory, DecisionRecord};
pub use load_balancer::selector::WeightedSelector;
pub use topology::{Topology, TopologyInventory};
