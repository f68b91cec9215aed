//! Best-effort weight reads with last-known fallback.

use std::sync::Arc;
use std::time::Duration;

use splitway_core::{ServiceId, SharedWeightStore, WeightPair};
use tokio::time;

use crate::config::ControlPlaneConfig;
use crate::error::ControlPlaneError;
use crate::source::VirtualServiceSource;

/// Reads each service's active weight split from its virtual service.
///
/// Every call is bounded by a fixed timeout and never retried inline. A
/// failed read yields the pair currently held by the weight store, so
/// routing keeps working on stale weights while the control plane is down.
pub struct WeightReader {
    source: Arc<dyn VirtualServiceSource>,
    store: SharedWeightStore,
    namespace: String,
    rule_index: usize,
    timeout: Duration,
}

impl WeightReader {
    /// Create a reader over `source`, falling back to `store`.
    pub fn new(
        source: Arc<dyn VirtualServiceSource>,
        store: SharedWeightStore,
        config: &ControlPlaneConfig,
    ) -> Self {
        Self {
            source,
            store,
            namespace: config.namespace.clone(),
            rule_index: config.rule_index,
            timeout: config.timeout,
        }
    }

    /// The store used for fallbacks.
    pub fn store(&self) -> &SharedWeightStore {
        &self.store
    }

    /// Read `service`'s split, surfacing the failure.
    pub async fn try_refresh(&self, service: ServiceId) -> Result<WeightPair, ControlPlaneError> {
        let name = service.virtual_service_name();
        let fetch = self.source.fetch(&self.namespace, &name);
        let virtual_service = time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| ControlPlaneError::Timeout(self.timeout))??;
        virtual_service.extract_weights(service, self.rule_index)
    }

    /// Read `service`'s split, logging and discarding a failure.
    pub async fn read(&self, service: ServiceId) -> Option<WeightPair> {
        match self.try_refresh(service).await {
            Ok(pair) => {
                tracing::debug!(
                    %service,
                    ctx1 = pair.primary,
                    ctx2 = pair.secondary,
                    "weights from virtual service"
                );
                Some(pair)
            }
            Err(err) => {
                tracing::warn!(%service, %err, "weight refresh failed, keeping last-known weights");
                None
            }
        }
    }

    /// Read `service`'s split, or its last-known pair if the read fails.
    pub async fn refresh(&self, service: ServiceId) -> WeightPair {
        match self.read(service).await {
            Some(pair) => pair,
            None => self.store.current().get(service),
        }
    }
}

impl std::fmt::Debug for WeightReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightReader")
            .field("namespace", &self.namespace)
            .field("rule_index", &self.rule_index)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
