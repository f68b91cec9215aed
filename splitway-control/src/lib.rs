//! Splitway Control Plane
//!
//! Reads the active traffic split of every logical service from its Istio
//! `VirtualService` and publishes the result into the shared weight store,
//! either on demand or from a background poller.

pub mod config;
pub mod error;
pub mod reader;
pub mod source;
pub mod sync;
pub mod virtual_service;

#[cfg(test)]
mod testing;

pub use config::{ControlPlaneConfig, Endpoint};
pub use error::ControlPlaneError;
pub use reader::WeightReader;
pub use source::{DisconnectedSource, KubeApiSource, VirtualServiceSource};
pub use sync::{spawn_weight_poller, WeightSync};
pub use virtual_service::VirtualService;
