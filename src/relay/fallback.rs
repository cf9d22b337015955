//! Fallback responses for failed relays.
//!
//! The fallback is called at most once per request, inline, with the first
//! error that stopped the relay.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::relay::error::RelayError;

/// What the fallback knows about the failed request.
#[derive(Debug, Clone)]
pub struct FallbackContext {
    pub method: Method,
    pub path: String,
    pub request_id: Option<String>,
}

impl FallbackContext {
    pub fn from_request(method: Method, request: &Request<Body>) -> Self {
        Self {
            method,
            path: request.uri().path().to_string(),
            request_id: request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Converts a relay error into the caller's response.
pub type Fallback = Arc<dyn Fn(&FallbackContext, &RelayError) -> Response + Send + Sync>;

/// Status 200 with `{"status": {"code": 500, "error": "..."}}`.
pub fn default_fallback() -> Fallback {
    Arc::new(|_ctx: &FallbackContext, err: &RelayError| {
        (
            StatusCode::OK,
            Json(json!({
                "status": {
                    "code": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "error": err.to_string(),
                }
            })),
        )
            .into_response()
    })
}
