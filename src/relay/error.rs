//! Per-request relay failures.
//!
//! Every variant is recovered locally: the controller hands it to the
//! configured fallback and keeps serving.

use std::str::Utf8Error;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("read request body failed: {0}")]
    ReadBody(#[source] axum::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse form error: {0}")]
    Form(#[from] Utf8Error),

    #[error("invalid gateway uri: {0}")]
    Uri(#[from] axum::http::Error),

    #[error("gateway request failed: {0}")]
    Dispatch(#[source] hyper_util::client::legacy::Error),

    #[error("gateway request timed out after {0}s")]
    Timeout(u64),

    #[error("read gateway response failed: {0}")]
    ReadResponse(#[source] axum::Error),

    #[error("gateway response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}
