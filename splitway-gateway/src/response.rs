//! Response bodies and JSON helpers.

use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use serde::Serialize;

/// Body type of every response the gateway produces.
pub type ResponseBody = BoxBody<Bytes, hyper::Error>;

/// Wrap a complete buffer as a response body.
pub fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

fn with_body(
    status: StatusCode,
    content_type: &'static str,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Serialize `value` as a `200 OK` JSON response.
pub fn json<T: Serialize>(value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(bytes) => with_body(StatusCode::OK, "application/json", full(bytes)),
        Err(err) => {
            tracing::error!(%err, "failed to encode response");
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode response")
        }
    }
}

/// A JSON `{"error": message}` response with `status`.
pub fn error(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let body = serde_json::json!({ "error": message }).to_string();
    with_body(status, "application/json", full(body))
}

/// A plain-text response.
pub fn text(status: StatusCode, body: &'static str) -> Response<ResponseBody> {
    with_body(status, "text/plain; charset=utf-8", full(body))
}
