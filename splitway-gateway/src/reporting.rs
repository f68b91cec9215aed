//! Observability endpoints: weights, decision history and topology.

use chrono::Utc;
use http::Response;

use crate::response::{self, ResponseBody};
use crate::state::GatewayState;

/// `GET /traffic-weights`: the weights as just re-read from the control plane.
pub async fn traffic_weights(state: &GatewayState) -> Response<ResponseBody> {
    let snapshot = state.sync.refresh_snapshot().await;
    tracing::debug!(weights = ?snapshot, "serving traffic weights");
    response::json(&*snapshot)
}

/// `GET /traffic-history`: up to ten recent cluster labels per service.
pub fn traffic_history(state: &GatewayState) -> Response<ResponseBody> {
    response::json(&state.history.snapshot_all())
}

/// `GET /topology`: the inventory annotated with fresh weights.
pub async fn topology(state: &GatewayState) -> Response<ResponseBody> {
    let snapshot = state.sync.refresh_snapshot().await;
    response::json(&state.inventory.build(&snapshot, Utc::now()))
}
