//! gRPC gateway wiring.
//!
//! # Data Flow
//! ```text
//! GatewayConfig.grpc.clients
//!     → connections.rs (one tonic channel per backend name)
//!     → registry.rs (named handlers add routes to the axum mux)
//!     → server.rs (listen on gateway.host:gateway.port)
//! ```
//!
//! The generated gRPC-gateway routes themselves are opaque: a handler is any
//! function that takes the mux and a connection and returns the extended mux.

pub mod connections;
pub mod error;
pub mod registry;
pub mod server;

pub use connections::{ConnectionPool, GrpcConnection, InterceptorChain};
pub use error::GatewayError;
pub use registry::{BoxError, Handler, HandlerRegistry, InterceptorFn};
pub use server::{GatewayServer, GatewayState};
