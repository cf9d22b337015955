//! HTTP forwarding controller.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → transform.rs (URL rewrite, query merge)
//!     → client.rs (dispatch, buffer body)
//!     → writer.rs (copy headers, status 200, JSON content type)
//!     → caller
//! any error ─→ fallback
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Method, Request},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{GatewayAddress, GatewayConfig, RelayConfig};
use crate::relay::client::RelayClient;
use crate::relay::error::RelayError;
use crate::relay::fallback::{default_fallback, Fallback, FallbackContext};
use crate::relay::transform::{transform, InboundRequest};
use crate::relay::writer::write_response;

const X_REQUEST_ID: &str = "x-request-id";

/// Forwards plain HTTP requests to the gateway listener.
///
/// Cheap to clone; all clones share the client and settings.
#[derive(Clone)]
pub struct Relay {
    target: Arc<GatewayAddress>,
    settings: Arc<RelayConfig>,
    client: RelayClient,
    fallback: Fallback,
}

impl Relay {
    /// Create a relay sending to `target`, using the default fallback.
    pub fn new(target: GatewayAddress, settings: RelayConfig) -> Self {
        Self {
            target: Arc::new(target),
            client: RelayClient::new(&settings),
            settings: Arc::new(settings),
            fallback: default_fallback(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.gateway.clone(), config.relay.clone())
    }

    /// Replace the fallback used when a relay fails.
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&FallbackContext, &RelayError) -> Response + Send + Sync + 'static,
    {
        self.fallback = Arc::new(fallback);
        self
    }

    pub async fn get(&self, request: Request<Body>) -> Response {
        self.forward(Method::GET, request).await
    }

    pub async fn post(&self, request: Request<Body>) -> Response {
        self.forward(Method::POST, request).await
    }

    pub async fn put(&self, request: Request<Body>) -> Response {
        self.forward(Method::PUT, request).await
    }

    pub async fn delete(&self, request: Request<Body>) -> Response {
        self.forward(Method::DELETE, request).await
    }

    pub async fn patch(&self, request: Request<Body>) -> Response {
        self.forward(Method::PATCH, request).await
    }

    /// Relay `request` as `method`; any failure goes to the fallback once.
    pub async fn forward(&self, method: Method, request: Request<Body>) -> Response {
        let ctx = FallbackContext::from_request(method.clone(), &request);

        tracing::debug!(
            request_id = ctx.request_id.as_deref().unwrap_or("unknown"),
            method = %method,
            path = %ctx.path,
            "Relaying request"
        );

        match self.relay(method, request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    request_id = ctx.request_id.as_deref().unwrap_or("unknown"),
                    method = %ctx.method,
                    path = %ctx.path,
                    error = %err,
                    "Relay failed, using fallback"
                );
                (self.fallback)(&ctx, &err)
            }
        }
    }

    async fn relay(&self, method: Method, request: Request<Body>) -> Result<Response, RelayError> {
        let inbound = InboundRequest::from_request(request, self.settings.max_request_bytes).await?;
        let outbound = transform(&self.target, self.settings.query_values, method, inbound)?;
        let relayed = self.client.send(outbound).await?;
        Ok(write_response(relayed))
    }

    /// Router dispatching GET/POST/PUT/DELETE/PATCH on every path to this relay.
    pub fn router(&self) -> Router {
        let methods = get(get_handler)
            .post(post_handler)
            .put(put_handler)
            .delete(delete_handler)
            .patch(patch_handler);
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", methods.clone())
            .route("/{*path}", methods)
            .with_state(self.clone())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Serve the relay router until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            gateway = %self.target.socket_address(),
            "Relay listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Relay stopped");
        Ok(())
    }
}

async fn get_handler(State(relay): State<Relay>, request: Request<Body>) -> Response {
    relay.get(request).await
}

async fn post_handler(State(relay): State<Relay>, request: Request<Body>) -> Response {
    relay.post(request).await
}

async fn put_handler(State(relay): State<Relay>, request: Request<Body>) -> Response {
    relay.put(request).await
}

async fn delete_handler(State(relay): State<Relay>, request: Request<Body>) -> Response {
    relay.delete(request).await
}

async fn patch_handler(State(relay): State<Relay>, request: Request<Body>) -> Response {
    relay.patch(request).await
}
