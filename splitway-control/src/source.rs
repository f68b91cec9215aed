//! Clients that fetch virtual services from the control plane.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config};
use secrecy::SecretString;

use crate::config::{ControlPlaneConfig, Endpoint};
use crate::error::ControlPlaneError;
use crate::virtual_service::VirtualService;

/// Read-only access to routing resources.
#[async_trait]
pub trait VirtualServiceSource: Send + Sync {
    /// Fetch the virtual service `name` in `namespace`.
    async fn fetch(&self, namespace: &str, name: &str) -> Result<VirtualService, ControlPlaneError>;
}

/// A source that has no client and fails every read.
#[derive(Debug, Clone)]
pub struct DisconnectedSource {
    reason: String,
}

impl DisconnectedSource {
    /// Create a disconnected source remembering why no client exists.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl VirtualServiceSource for DisconnectedSource {
    async fn fetch(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<VirtualService, ControlPlaneError> {
        Err(ControlPlaneError::Unavailable(self.reason.clone()))
    }
}

/// Reads `networking.istio.io/v1` virtual services through a `kube` client.
///
/// Credentials come from the client configuration, so rotated
/// service-account tokens and kubeconfig exec plugins are picked up by the
/// client itself.
#[derive(Clone)]
pub struct KubeApiSource {
    client: Client,
    resource: ApiResource,
    cluster_url: String,
}

impl KubeApiSource {
    /// Build a source from a prepared client configuration.
    ///
    /// `timeout` bounds connecting to and reading from the API server.
    pub fn from_config(mut config: Config, timeout: Duration) -> Result<Self, ControlPlaneError> {
        config.connect_timeout = Some(timeout);
        config.read_timeout = Some(timeout);
        let cluster_url = config.cluster_url.to_string();
        let client = Client::try_from(config).map_err(|err| {
            ControlPlaneError::Unavailable(format!("building Kubernetes client: {err}"))
        })?;
        Ok(Self {
            client,
            resource: virtual_service_resource(),
            cluster_url,
        })
    }

    /// Connect to an explicit API server URL, e.g. a local `kubectl proxy`.
    pub fn with_url(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ControlPlaneError> {
        let uri = base_url.parse::<http::Uri>().map_err(|err| {
            ControlPlaneError::Unavailable(format!("invalid control plane URL '{base_url}': {err}"))
        })?;
        let mut config = Config::new(uri);
        config.auth_info.token = token.map(SecretString::from);
        Self::from_config(config, timeout)
    }

    /// Connect using the local kubeconfig or the pod's service account,
    /// whichever is available.
    pub async fn infer(timeout: Duration) -> Result<Self, ControlPlaneError> {
        let config = Config::infer().await.map_err(|err| {
            ControlPlaneError::Unavailable(format!("no Kubernetes configuration: {err}"))
        })?;
        Self::from_config(config, timeout)
    }

    /// Build the source described by `config`, or a [`DisconnectedSource`]
    /// if no client can be created.
    pub async fn connect(config: &ControlPlaneConfig) -> Arc<dyn VirtualServiceSource> {
        let source = match &config.endpoint {
            Endpoint::Inferred => Self::infer(config.timeout).await,
            Endpoint::Url { base, token } => Self::with_url(base, token.clone(), config.timeout),
        };
        match source {
            Ok(source) => {
                tracing::info!(cluster_url = %source.cluster_url, "control plane client ready");
                Arc::new(source)
            }
            Err(err) => {
                tracing::warn!(
                    %err,
                    "control plane client not available, using cached weights only"
                );
                Arc::new(DisconnectedSource::new(err.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for KubeApiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApiSource")
            .field("cluster_url", &self.cluster_url)
            .field("resource", &self.resource.plural)
            .finish_non_exhaustive()
    }
}

fn virtual_service_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk("networking.istio.io", "v1", "VirtualService");
    ApiResource::from_gvk_with_plural(&gvk, "virtualservices")
}

fn classify(err: kube::Error, namespace: &str, name: &str) -> ControlPlaneError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ControlPlaneError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(response) => ControlPlaneError::Status(response.code),
        kube::Error::SerdeError(err) => ControlPlaneError::Malformed(err.to_string()),
        other => ControlPlaneError::Transport(Box::new(other)),
    }
}

#[async_trait]
impl VirtualServiceSource for KubeApiSource {
    async fn fetch(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualService, ControlPlaneError> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &self.resource);
        let object = api
            .get(name)
            .await
            .map_err(|err| classify(err, namespace, name))?;
        serde_json::from_value(object.data)
            .map_err(|err| ControlPlaneError::Malformed(err.to_string()))
    }
}
