//! Request transformation.
//!
//! # Responsibilities
//! - Drain the inbound body exactly once
//! - Rewrite the URL onto the configured gateway host and port
//! - Merge query parameters into JSON and form bodies for non-GET methods
//! - Copy inbound headers, leaving framing headers to the HTTP client
//!
//! # Design Decisions
//! - GET carries no body; its raw query string is appended verbatim
//! - Only scheme and authority are rewritten. The inbound path and query
//!   keep their exact bytes, with no dot-segment or percent normalization
//! - Body fields win over query parameters on key collision
//! - Only the first value of a repeated query key is merged
//! - Headers are copied in `HeaderMap` order taking the first value of each
//!   name, so the result never depends on hash iteration order

use std::str::FromStr;

use axum::body::{Body, Bytes};
use axum::http::uri::{Authority, Parts, PathAndQuery, Scheme};
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Uri};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::{GatewayAddress, QueryValues};
use crate::relay::error::RelayError;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Headers the outbound client derives itself.
const SKIPPED_REQUEST_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// The parts of an inbound request the relay needs, with the body buffered.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub path: String,
    pub raw_query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    /// Consume a request, reading at most `limit` body bytes.
    pub async fn from_request(request: Request<Body>, limit: usize) -> Result<Self, RelayError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(RelayError::ReadBody)?;

        Ok(Self {
            path: parts.uri.path().to_string(),
            raw_query: parts
                .uri
                .query()
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            headers: parts.headers,
            body,
        })
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Query parameters in encoded order, first value per key.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let Some(raw) = self.raw_query.as_deref() else {
            return pairs;
        };

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if !pairs.iter().any(|(k, _)| *k == key) {
                pairs.push((key.into_owned(), value.into_owned()));
            }
        }
        pairs
    }
}

/// A request ready to be dispatched to the gateway.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Build the outbound request for `method` against `target`.
pub fn transform(
    target: &GatewayAddress,
    query_values: QueryValues,
    method: Method,
    inbound: InboundRequest,
) -> Result<OutboundRequest, RelayError> {
    let (path_and_query, body) = if method == Method::GET {
        let path_and_query = match inbound.raw_query.as_deref() {
            Some(raw_query) => format!("{}?{}", inbound.path, raw_query),
            None => inbound.path.clone(),
        };
        (path_and_query, None)
    } else {
        (inbound.path.clone(), Some(transform_body(&inbound, query_values)?))
    };

    Ok(OutboundRequest {
        method,
        uri: gateway_uri(target, &path_and_query)?,
        headers: copy_request_headers(&inbound.headers),
        body,
    })
}

/// Point `path_and_query` at the gateway, leaving it byte-for-byte intact.
fn gateway_uri(target: &GatewayAddress, path_and_query: &str) -> Result<Uri, axum::http::Error> {
    let mut parts = Parts::default();
    parts.scheme = Some(Scheme::from_str(&target.scheme)?);
    parts.authority = Some(Authority::from_str(&target.socket_address())?);
    parts.path_and_query = Some(PathAndQuery::from_str(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

fn transform_body(inbound: &InboundRequest, query_values: QueryValues) -> Result<Bytes, RelayError> {
    let content_type = inbound.content_type();

    if content_type.contains(JSON_CONTENT_TYPE) {
        merge_json(&inbound.body, &inbound.query_pairs(), query_values)
    } else if content_type.contains(FORM_CONTENT_TYPE) {
        merge_form(&inbound.body, &inbound.query_pairs())
    } else {
        Ok(inbound.body.clone())
    }
}

/// Merge query pairs into a JSON object body. An empty body counts as `{}`.
pub fn merge_json(
    body: &[u8],
    query: &[(String, String)],
    query_values: QueryValues,
) -> Result<Bytes, RelayError> {
    let mut fields: Map<String, Value> = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        serde_json::from_slice(body)?
    };

    for (key, value) in query {
        if !fields.contains_key(key) {
            fields.insert(key.clone(), query_value(value, query_values));
        }
    }

    Ok(Bytes::from(serde_json::to_vec(&fields)?))
}

fn query_value(raw: &str, query_values: QueryValues) -> Value {
    if query_values == QueryValues::Typed {
        if let Ok(value @ (Value::Number(_) | Value::Bool(_))) = serde_json::from_str::<Value>(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Merge query pairs into a form-encoded body, keeping body pairs first.
pub fn merge_form(body: &[u8], query: &[(String, String)]) -> Result<Bytes, RelayError> {
    let body = std::str::from_utf8(body)?;
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect();
    let present = pairs.len();

    for (key, value) in query {
        if !pairs[..present].iter().any(|(k, _)| k == key) {
            pairs.push((key.clone(), value.clone()));
        }
    }

    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    Ok(Bytes::from(encoded))
}

fn copy_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.keys_len());
    for name in inbound.keys() {
        if SKIPPED_REQUEST_HEADERS.contains(name) {
            continue;
        }
        if let Some(value) = inbound.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    headers
}
