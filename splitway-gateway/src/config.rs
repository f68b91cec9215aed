//! Gateway configuration sourced from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use http::uri::Scheme;
use http::Uri;
use splitway_control::ControlPlaneConfig;
use splitway_core::{Cluster, ServiceId};

use crate::error::ConfigError;

/// Listen address used when `GATEWAY_LISTEN_ADDR` is unset.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Polling period used when `WEIGHT_REFRESH_INTERVAL_SECS` is unset.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// When routing weights are re-read from the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// A background task refreshes every service on this period.
    Interval(Duration),
    /// The dispatched service is refreshed before every selection.
    PerRequest,
}

/// One cluster replica of a logical service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// Cluster the replica runs in.
    pub cluster: Cluster,
    /// Base URL requests are forwarded to.
    pub uri: Uri,
}

/// The two replicas of a logical service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPair {
    /// The `ctx1` replica.
    pub primary: Backend,
    /// The `ctx2` replica.
    pub secondary: Backend,
}

/// Upstream replicas of every logical service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backends {
    pairs: Vec<BackendPair>,
}

impl Backends {
    /// Backends of `service`.
    pub fn get(&self, service: ServiceId) -> &BackendPair {
        &self.pairs[service.index()]
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = |service: ServiceId, cluster: Cluster| -> Result<Backend, ConfigError> {
            let key = backend_var(service, cluster);
            let value = lookup(&key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default_backend_url(service, cluster));
            Ok(Backend {
                cluster,
                uri: parse_backend_uri(&key, &value)?,
            })
        };

        let pairs = ServiceId::ALL
            .into_iter()
            .map(|service| {
                Ok(BackendPair {
                    primary: backend(service, Cluster::Primary)?,
                    secondary: backend(service, Cluster::Secondary)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { pairs })
    }
}

/// Name of the backend URL variable, e.g. `USER_SERVICE_CTX1_URL`.
pub fn backend_var(service: ServiceId, cluster: Cluster) -> String {
    format!("{}_{}_URL", service.env_prefix(), cluster.label().to_ascii_uppercase())
}

fn default_backend_url(service: ServiceId, cluster: Cluster) -> String {
    format!("http://{}:{}", service.node_name(cluster), service.port())
}

fn parse_backend_uri(key: &str, value: &str) -> Result<Uri, ConfigError> {
    let uri: Uri = value.parse().map_err(|source| ConfigError::InvalidBackendUrl {
        key: key.to_string(),
        value: value.to_string(),
        source,
    })?;
    if uri.scheme() != Some(&Scheme::HTTP) {
        return Err(ConfigError::UnsupportedScheme {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    if uri.authority().is_none() {
        return Err(ConfigError::MissingAuthority {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(uri)
}

/// Everything the gateway needs to start.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket the listener binds.
    pub listen_addr: SocketAddr,
    /// Upstream replicas.
    pub backends: Backends,
    /// Weight refresh policy.
    pub refresh: RefreshMode,
    /// Optional east-west relay shown in the topology.
    pub relay_node: Option<String>,
    /// Control-plane reader settings.
    pub control_plane: ControlPlaneConfig,
}

impl GatewayConfig {
    /// Read the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen =
            non_empty("GATEWAY_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = listen
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddr {
                value: listen.clone(),
                source,
            })?;

        let refresh = match non_empty("WEIGHT_REFRESH_INTERVAL_SECS") {
            None => RefreshMode::Interval(DEFAULT_REFRESH_INTERVAL),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => RefreshMode::PerRequest,
                Ok(secs) => RefreshMode::Interval(Duration::from_secs(secs)),
                Err(source) => {
                    return Err(ConfigError::InvalidRefreshInterval { value: raw, source })
                }
            },
        };

        Ok(Self {
            listen_addr,
            backends: Backends::from_lookup(&lookup)?,
            refresh,
            relay_node: non_empty("TOPOLOGY_RELAY_NODE"),
            control_plane: ControlPlaneConfig::from_lookup(&lookup),
        })
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}
