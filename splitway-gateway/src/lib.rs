//! Splitway Gateway
//!
//! The dispatch front-end: maps inbound path prefixes to logical services,
//! splits their traffic between the `ctx1` and `ctx2` replicas by weight and
//! serves the weights, decision history and topology for observability.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod reporting;
pub mod response;
pub mod server;
pub mod state;

pub use config::{GatewayConfig, RefreshMode};
pub use error::{ConfigError, GatewayError};
pub use state::{GatewayState, SharedGatewayState};
