//! Gateway server: gRPC connections, handler registration, HTTP listener.
//!
//! # Startup
//! ```text
//! Uninitialized
//!     → Connecting   (one lazy channel per configured client)
//!     → Registering  (each named handler wires routes into the mux)
//!     → Serving      (blocking HTTP listen)
//!     → Stopped      (shutdown signal or listener error)
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error aborts before the listener binds
//! - Connections are built once, before traffic, and never mutated

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::gateway::connections::ConnectionPool;
use crate::gateway::error::GatewayError;
use crate::gateway::registry::HandlerRegistry;

/// Observable startup state of a [`GatewayServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Uninitialized,
    Connecting,
    Registering,
    Serving,
    Stopped,
}

pub struct GatewayServer {
    config: GatewayConfig,
    registry: HandlerRegistry,
    state: watch::Sender<GatewayState>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, registry: HandlerRegistry) -> Self {
        let (state, _) = watch::channel(GatewayState::Uninitialized);
        Self {
            config,
            registry,
            state,
        }
    }

    /// Subscribe to state transitions.
    pub fn state(&self) -> watch::Receiver<GatewayState> {
        self.state.subscribe()
    }

    /// Connect every client and register its handlers onto `mux`.
    pub fn build_router(&self, mux: Router) -> Result<Router, GatewayError> {
        let address = &self.config.gateway;
        if address.host.is_empty() || address.port.is_empty() {
            return Err(GatewayError::MissingAddress);
        }

        let clients = &self.config.grpc.clients;

        self.transition(GatewayState::Connecting);
        let mut pool = ConnectionPool::new(Duration::from_secs(self.config.grpc.connect_timeout_secs));
        for (name, client) in clients {
            if name.is_empty() {
                return Err(GatewayError::MissingClientName);
            }
            pool.connect(name, client, &self.registry)?;
            if client.handlers.is_none() {
                return Err(GatewayError::MissingHandlers(name.clone()));
            }
        }

        self.transition(GatewayState::Registering);
        let mut router = mux;
        for (name, client) in clients {
            let Some(connection) = pool.get(name) else {
                continue;
            };
            for handler_name in client.handlers.iter().flatten() {
                let handler = self.registry.handler(handler_name).ok_or_else(|| {
                    GatewayError::UnknownHandler {
                        client: name.clone(),
                        handler: handler_name.clone(),
                    }
                })?;

                router = handler(router, connection).map_err(|source| GatewayError::Register {
                    name: name.clone(),
                    source,
                })?;
                tracing::debug!(client = %name, handler = %handler_name, "Handler registered");
            }
        }

        tracing::info!(clients = pool.len(), "Gateway handlers registered");
        Ok(router)
    }

    /// Run with an empty multiplexer.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), GatewayError> {
        self.run_with(Router::new(), shutdown).await
    }

    /// Build on `mux`, bind `gateway.host:gateway.port` and serve until shutdown.
    pub async fn run_with(
        self,
        mux: Router,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        let router = self
            .build_router(mux)
            .inspect_err(|_| self.transition(GatewayState::Stopped))?;

        let addr = self.config.gateway.socket_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            self.transition(GatewayState::Stopped);
            GatewayError::Listen(e)
        })?;

        self.serve(listener, router, shutdown).await
    }

    /// Serve an already built router on `listener`.
    pub async fn serve(
        &self,
        listener: TcpListener,
        router: Router,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        let addr = listener.local_addr().map_err(GatewayError::Listen)?;

        self.transition(GatewayState::Serving);
        tracing::info!(address = %addr, "Listening and serving Gateway");

        let result = axum::serve(listener, router.layer(TraceLayer::new_for_http()))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        self.transition(GatewayState::Stopped);
        match result {
            Ok(()) => {
                tracing::info!("Gateway stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Gateway listener failed");
                Err(GatewayError::Listen(e))
            }
        }
    }

    fn transition(&self, next: GatewayState) {
        tracing::debug!(state = ?next, "Gateway state");
        self.state.send_replace(next);
    }
}
