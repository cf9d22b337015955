//! HTTP-to-gRPC gateway plugin.
//!
//! Two paths share one configuration:
//! - [`gateway::GatewayServer`] connects to the configured gRPC backends,
//!   lets registered handlers wire their routes into an axum multiplexer and
//!   serves it on `gateway.host:gateway.port`.
//! - [`relay::Relay`] is a forwarding controller that proxies plain REST
//!   requests to that listener, merging query parameters into bodies.

pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::GatewayConfig;
pub use gateway::{GatewayServer, HandlerRegistry};
pub use lifecycle::Shutdown;
pub use relay::Relay;
