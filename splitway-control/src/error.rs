//! Control-plane error taxonomy.

use std::time::Duration;

/// Why a weight read against the control plane failed.
///
/// None of these reach the dispatch path; the reader logs them and falls
/// back to the last-known weights.
#[derive(Debug, thiserror::Error)]
pub enum ControlPlaneError {
    /// The routing resource does not exist.
    #[error("virtual service {namespace}/{name} not found")]
    NotFound {
        /// Namespace that was searched.
        namespace: String,
        /// Resource name.
        name: String,
    },
    /// The API server answered with a non-success status.
    #[error("control plane returned HTTP {0}")]
    Status(u16),
    /// The request could not be sent or the body could not be read.
    #[error("control plane transport error: {0}")]
    Transport(#[source] Box<kube::Error>),
    /// The resource was read but does not carry a usable weight split.
    #[error("malformed routing resource: {0}")]
    Malformed(String),
    /// The call did not complete within the per-call budget.
    #[error("control plane call timed out after {0:?}")]
    Timeout(Duration),
    /// No client is configured.
    #[error("control plane unavailable: {0}")]
    Unavailable(String),
}
