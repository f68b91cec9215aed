//! In-memory control plane used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ControlPlaneError;
use crate::source::VirtualServiceSource;
use crate::virtual_service::VirtualService;

/// A theater-shaped virtual service with a canary rule at index 0.
pub(crate) fn virtual_service(ctx1: u32, ctx2: u32) -> Value {
    json!({
        "spec": {
            "http": [
                {
                    "name": "canary",
                    "route": [{"destination": {"host": "svc", "subset": "ctx2"}, "weight": 100}]
                },
                {"route": [
                    {"destination": {"host": "svc", "subset": "ctx1"}, "weight": ctx1},
                    {"destination": {"host": "svc", "subset": "ctx2"}, "weight": ctx2}
                ]}
            ]
        }
    })
}

#[derive(Clone, Default)]
pub(crate) struct FakeSource {
    resources: Arc<Mutex<HashMap<String, Value>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(self, name: &str, resource: Value) -> Self {
        self.set(name, resource);
        self
    }

    /// Delay every read.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay reads of `name` only.
    pub(crate) fn with_slow(self, name: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(name.to_string(), delay);
        self
    }

    pub(crate) fn set(&self, name: &str, resource: Value) {
        self.resources
            .lock()
            .unwrap()
            .insert(name.to_string(), resource);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VirtualServiceSource for FakeSource {
    async fn fetch(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualService, ControlPlaneError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(name).copied().or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let resource = self.resources.lock().unwrap().get(name).cloned();
        match resource {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| ControlPlaneError::Malformed(err.to_string())),
            None => Err(ControlPlaneError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }
}
