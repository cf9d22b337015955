//! Gateway startup failures. All of them are fatal.

use crate::gateway::registry::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("please initialize GATEWAY_HOST and GATEWAY_PORT")]
    MissingAddress,

    #[error("gRPC client name is required")]
    MissingClientName,

    #[error("gRPC {0} handlers is required")]
    MissingHandlers(String),

    #[error("gRPC {client} handler {handler} is not registered")]
    UnknownHandler { client: String, handler: String },

    #[error("gRPC {client} interceptor {interceptor} is not registered")]
    UnknownInterceptor { client: String, interceptor: String },

    #[error("init gRPC {name} client failed: {source}")]
    Connect {
        name: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("register gRPC {name} handler failed: {source}")]
    Register {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("HTTP listen failed: {0}")]
    Listen(#[source] std::io::Error),
}
