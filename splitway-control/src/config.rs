//! Control-plane connection settings.

use std::time::Duration;

use crate::virtual_service::DEFAULT_RULE_INDEX;

/// Namespace holding the theater virtual services.
pub const DEFAULT_NAMESPACE: &str = "theater-msa";

/// Upper bound on a single control-plane call.
pub const MAX_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// How the API server is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// The local kubeconfig, or the pod's service account when running
    /// in-cluster.
    Inferred,
    /// An explicit base URL, e.g. a local `kubectl proxy`.
    Url {
        /// Base URL without a trailing slash.
        base: String,
        /// Optional bearer token.
        token: Option<String>,
    },
}

/// Settings for the control-plane weight reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPlaneConfig {
    /// Namespace the virtual services live in.
    pub namespace: String,
    /// Index of the routing rule carrying the weight split.
    pub rule_index: usize,
    /// Per-call timeout, never above [`MAX_CALL_TIMEOUT`].
    pub timeout: Duration,
    /// API server endpoint.
    pub endpoint: Endpoint,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            rule_index: DEFAULT_RULE_INDEX,
            timeout: MAX_CALL_TIMEOUT,
            endpoint: Endpoint::Inferred,
        }
    }
}

impl ControlPlaneConfig {
    /// Read `CONTROL_PLANE_*` settings through `lookup`.
    ///
    /// Invalid values are logged and replaced by their defaults; the control
    /// plane is best-effort and never blocks startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let namespace = non_empty("CONTROL_PLANE_NAMESPACE").unwrap_or(defaults.namespace);

        let rule_index = match non_empty("CONTROL_PLANE_RULE_INDEX") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(
                    value = %raw,
                    %err,
                    "invalid CONTROL_PLANE_RULE_INDEX, using default"
                );
                defaults.rule_index
            }),
            None => defaults.rule_index,
        };

        let timeout = match non_empty("CONTROL_PLANE_TIMEOUT_MS") {
            Some(raw) => parse_timeout(&raw).unwrap_or(defaults.timeout),
            None => defaults.timeout,
        };

        let endpoint = match non_empty("CONTROL_PLANE_URL") {
            Some(base) => Endpoint::Url {
                base: base.trim_end_matches('/').to_string(),
                token: non_empty("CONTROL_PLANE_TOKEN"),
            },
            None => Endpoint::Inferred,
        };

        Self {
            namespace,
            rule_index,
            timeout,
            endpoint,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// A positive millisecond count, capped at [`MAX_CALL_TIMEOUT`].
fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.parse::<u64>() {
        Ok(0) => {
            tracing::warn!("CONTROL_PLANE_TIMEOUT_MS must be positive, using default");
            None
        }
        Ok(ms) => {
            let requested = Duration::from_millis(ms);
            if requested > MAX_CALL_TIMEOUT {
                tracing::warn!(?requested, max = ?MAX_CALL_TIMEOUT, "control plane timeout capped");
            }
            Some(requested.min(MAX_CALL_TIMEOUT))
        }
        Err(err) => {
            tracing::warn!(value = %raw, %err, "invalid CONTROL_PLANE_TIMEOUT_MS, using default");
            None
        }
    }
}
