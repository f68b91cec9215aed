//! Server module for accepting connections and routing HTTP requests.

use std::convert::Infallible;
use std::net::SocketAddr;

use http::{Method, Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::dispatch::service_for_path;
use crate::error::GatewayError;
use crate::reporting;
use crate::response::{self, ResponseBody};
use crate::state::SharedGatewayState;

/// Binds `addr` and serves until `shutdown` flips to `true`.
pub async fn start_server(
    addr: SocketAddr,
    state: SharedGatewayState,
    shutdown: watch::Receiver<bool>,
) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })?;
    tracing::info!(%addr, "listening");
    serve(listener, state, shutdown).await;
    Ok(())
}

/// Accepts connections on `listener` until `shutdown` flips to `true` or its
/// sender is dropped. Connections already accepted run to completion.
pub async fn serve(
    listener: TcpListener,
    state: SharedGatewayState,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    tracing::warn!(%err, "failed to accept connection");
                    continue;
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let state = state.clone();
        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            });
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, %err, "error serving connection");
            }
        });
    }

    tracing::info!("listener stopped");
}

/// Routes one request to the reporting endpoints or the dispatcher.
async fn handle_request(
    req: Request<Incoming>,
    state: SharedGatewayState,
) -> Result<Response<ResponseBody>, Infallible> {
    let path = req.uri().path();
    tracing::debug!(method = %req.method(), %path, "request");

    if let Some(service) = service_for_path(path) {
        return Ok(state.dispatcher.dispatch(service, req).await);
    }

    let response = match (req.method(), path) {
        (&Method::GET, "/healthz") => response::text(StatusCode::OK, "ok"),
        (&Method::GET, p) if p.starts_with("/traffic-weights") => {
            reporting::traffic_weights(&state).await
        }
        (&Method::GET, p) if p.starts_with("/traffic-history") => {
            reporting::traffic_history(&state)
        }
        (&Method::GET, p) if p.starts_with("/topology") => reporting::topology(&state).await,
        _ => response::error(StatusCode::NOT_FOUND, "not found"),
    };
    Ok(response)
}
