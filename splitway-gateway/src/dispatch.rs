//! Dispatch front-end: maps a request to a logical service, picks a cluster
//! replica and forwards the request there.

use std::sync::Arc;

use http::header::{HeaderName, HOST};
use http::uri::PathAndQuery;
use http::{HeaderValue, Request, Response, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use splitway_control::WeightSync;
use splitway_core::{ServiceId, SharedWeightStore, WeightedSelector};

use crate::config::{Backend, Backends, RefreshMode};
use crate::error::GatewayError;
use crate::response::{self, ResponseBody};

/// Response header naming the cluster that served the request.
pub const ROUTED_CLUSTER_HEADER: HeaderName = HeaderName::from_static("x-routed-cluster");

/// Path prefixes served by each logical service.
const SERVICE_PREFIXES: [(&str, ServiceId); 3] = [
    ("/users/", ServiceId::User),
    ("/movies/", ServiceId::Movie),
    ("/bookings/", ServiceId::Booking),
];

/// The logical service owning `path`, if any.
pub fn service_for_path(path: &str) -> Option<ServiceId> {
    SERVICE_PREFIXES
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, service)| *service)
}

/// Rebase `original`'s path and query onto the backend `base` URL.
pub fn upstream_uri(base: &Uri, original: &Uri) -> Result<Uri, GatewayError> {
    let base_path = base.path().trim_end_matches('/');
    let tail = original.path_and_query().map(PathAndQuery::as_str).unwrap_or("/");
    let path_and_query = format!("{base_path}{tail}");

    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>().map_err(http::Error::from)?);
    Uri::from_parts(parts).map_err(|err| GatewayError::UpstreamRequest(err.into()))
}

/// Chooses a backend per request and forwards to it.
pub struct Dispatcher {
    selector: WeightedSelector,
    store: SharedWeightStore,
    sync: Arc<WeightSync>,
    backends: Backends,
    refresh: RefreshMode,
    client: Client<HttpConnector, Incoming>,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        selector: WeightedSelector,
        store: SharedWeightStore,
        sync: Arc<WeightSync>,
        backends: Backends,
        refresh: RefreshMode,
    ) -> Self {
        Self {
            selector,
            store,
            sync,
            backends,
            refresh,
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    /// Pick the backend for one request to `service`.
    ///
    /// The decision is recorded in the history before this returns,
    /// regardless of what happens to the forwarded request.
    pub async fn choose_backend(&self, service: ServiceId) -> &Backend {
        let pair = match self.refresh {
            RefreshMode::PerRequest => self.sync.refresh_service(service).await,
            RefreshMode::Interval(_) => self.store.current().get(service),
        };
        let backends = self.backends.get(service);
        self.selector.select(&pair, &backends.primary, &backends.secondary)
    }

    /// Route and forward `request` for `service`.
    pub async fn dispatch(
        &self,
        service: ServiceId,
        request: Request<Incoming>,
    ) -> Response<ResponseBody> {
        let backend = self.choose_backend(service).await;
        tracing::info!(
            %service,
            cluster = %backend.cluster,
            upstream = %backend.uri,
            method = %request.method(),
            path = request.uri().path(),
            "routing request"
        );

        match self.forward(backend, request).await {
            Ok(mut response) => {
                let label = HeaderValue::from_static(backend.cluster.label());
                response.headers_mut().insert(ROUTED_CLUSTER_HEADER, label);
                response
            }
            Err(err) => {
                tracing::warn!(%service, cluster = %backend.cluster, %err, "forwarding failed");
                response::error(StatusCode::BAD_GATEWAY, "upstream unavailable")
            }
        }
    }

    async fn forward(
        &self,
        backend: &Backend,
        request: Request<Incoming>,
    ) -> Result<Response<ResponseBody>, GatewayError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = upstream_uri(&backend.uri, &parts.uri)?;
        // The client fills in the upstream's own authority.
        parts.headers.remove(HOST);

        let response = self.client.request(Request::from_parts(parts, body)).await?;
        Ok(response.map(|body| body.boxed()))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("backends", &self.backends)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_map_to_services() {
        assert_eq!(service_for_path("/users/42"), Some(ServiceId::User));
        assert_eq!(service_for_path("/movies/"), Some(ServiceId::Movie));
        assert_eq!(service_for_path("/bookings/7/seats"), Some(ServiceId::Booking));
        assert_eq!(service_for_path("/users"), None);
        assert_eq!(service_for_path("/topology"), None);
    }

    #[test]
    fn upstream_uri_keeps_path_and_query() {
        let base: Uri = "http://user-service-ctx2:8081".parse().unwrap();
        let original: Uri = "/users/42?expand=bookings".parse().unwrap();
        let uri = upstream_uri(&base, &original).unwrap();
        assert_eq!(uri.authority().unwrap().as_str(), "user-service-ctx2:8081");
        assert_eq!(uri.path_and_query().unwrap().as_str(), "/users/42?expand=bookings");
        assert_eq!(uri.scheme_str(), Some("http"));
    }

    #[test]
    fn upstream_uri_prefixes_base_path() {
        let base: Uri = "http://10.0.0.5:30081/api/".parse().unwrap();
        let original: Uri = "/users/1".parse().unwrap();
        let uri = upstream_uri(&base, &original).unwrap();
        assert_eq!(uri.path(), "/api/users/1");
    }
}
