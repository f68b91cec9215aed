//! Gateway error types.

use std::net::{AddrParseError, SocketAddr};
use std::num::ParseIntError;

/// Invalid gateway configuration. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `GATEWAY_LISTEN_ADDR` is not a socket address.
    #[error("invalid listen address '{value}': {source}")]
    InvalidListenAddr {
        /// Offending value.
        value: String,
        /// Parse failure.
        source: AddrParseError,
    },
    /// A backend URL does not parse.
    #[error("invalid backend URL in {key}: '{value}': {source}")]
    InvalidBackendUrl {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
        /// Parse failure.
        source: http::uri::InvalidUri,
    },
    /// A backend URL is not plain `http`.
    #[error("backend URL in {key} must use http: '{value}'")]
    UnsupportedScheme {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
    /// A backend URL has no host.
    #[error("backend URL in {key} has no host: '{value}'")]
    MissingAuthority {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
    /// `WEIGHT_REFRESH_INTERVAL_SECS` is not a whole number of seconds.
    #[error("invalid refresh interval '{value}': {source}")]
    InvalidRefreshInterval {
        /// Offending value.
        value: String,
        /// Parse failure.
        source: ParseIntError,
    },
}

/// Errors raised while running the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A forwarded request could not be built.
    #[error("invalid upstream request: {0}")]
    UpstreamRequest(#[from] http::Error),
    /// The upstream could not be reached.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}
