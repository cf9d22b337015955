//! Response writing.
//!
//! The downstream status is discarded: callers always see 200 and read the
//! structured status inside the body. Content type is forced to JSON.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

use crate::relay::client::RelayResponse;
use crate::relay::transform::JSON_CONTENT_TYPE;

/// Framing and hop-by-hop headers recomputed by the server.
const SKIPPED_RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// Turn a relayed response into the caller's response.
///
/// Each header name contributes its first value, and only when that value is
/// non-empty.
pub fn write_response(relayed: RelayResponse) -> Response {
    if !relayed.status.is_success() {
        tracing::debug!(status = %relayed.status, "Masking downstream status");
    }

    let mut headers = HeaderMap::with_capacity(relayed.headers.keys_len() + 1);
    for name in relayed.headers.keys() {
        if SKIPPED_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        if let Some(value) = relayed.headers.get(name).filter(|v| !v.is_empty()) {
            headers.insert(name.clone(), value.clone());
        }
    }
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    let mut response = Response::new(Body::from(relayed.body));
    *response.status_mut() = StatusCode::OK;
    *response.headers_mut() = headers;
    response
}
