//! Outbound dispatch to the gateway listener.
//!
//! The whole downstream body is buffered before returning, bounded by
//! `max_response_bytes`. The response (and its connection) is released when
//! `send` returns, on success and on error alike.
//!
//! The request URI is sent exactly as built by the transformer; the client
//! never re-parses or normalizes the path and query.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use futures_util::StreamExt;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::RelayConfig;
use crate::relay::error::RelayError;
use crate::relay::transform::OutboundRequest;

/// A fully buffered downstream response.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HTTP client used for every relayed request.
#[derive(Clone)]
pub struct RelayClient {
    client: Client<HttpConnector, Body>,
    timeout_secs: u64,
    max_response_bytes: usize,
}

impl RelayClient {
    pub fn new(config: &RelayConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
            timeout_secs: config.timeout_secs,
            max_response_bytes: config.max_response_bytes,
        }
    }

    /// Dispatch `request` and read the complete response body within the
    /// configured deadline.
    pub async fn send(&self, request: OutboundRequest) -> Result<RelayResponse, RelayError> {
        let deadline = Duration::from_secs(self.timeout_secs);
        tokio::time::timeout(deadline, self.exchange(request))
            .await
            .map_err(|_| RelayError::Timeout(self.timeout_secs))?
    }

    async fn exchange(&self, request: OutboundRequest) -> Result<RelayResponse, RelayError> {
        let body = request.body.map(Body::from).unwrap_or_else(Body::empty);
        let mut outbound = Request::new(body);
        *outbound.method_mut() = request.method;
        *outbound.uri_mut() = request.uri;
        *outbound.headers_mut() = request.headers;

        let response = self
            .client
            .request(outbound)
            .await
            .map_err(RelayError::Dispatch)?;

        let limit = self.max_response_bytes;
        let declared = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared.is_some_and(|len| len > limit as u64) {
            return Err(RelayError::ResponseTooLarge { limit });
        }

        let (parts, incoming) = response.into_parts();
        let mut stream = Body::new(incoming).into_data_stream();

        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(RelayError::ReadResponse)?;
            if body.len() + chunk.len() > limit {
                return Err(RelayError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(RelayResponse {
            status: parts.status,
            headers: parts.headers,
            body: Bytes::from(body),
        })
    }
}
