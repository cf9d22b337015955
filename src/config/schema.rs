//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address of the gateway listener that relayed requests are sent to.
    pub gateway: GatewayAddress,

    /// Forwarding controller settings.
    pub relay: RelayConfig,

    /// gRPC backends wired into the gateway multiplexer.
    pub grpc: GrpcConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Host and port of the gateway listener.
///
/// Both are kept as strings; an empty value is only fatal once the
/// gateway server is started.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayAddress {
    pub host: String,
    pub port: String,

    /// URL scheme used by the relay. Only "http" is dialed.
    pub scheme: String,
}

impl Default for GatewayAddress {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: String::new(),
            scheme: "http".to_string(),
        }
    }
}

impl GatewayAddress {
    /// `host:port`, as passed to the listener.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How query values are typed when merged into a JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryValues {
    /// Always insert the raw string.
    #[default]
    String,
    /// Insert numbers and booleans as JSON numbers and booleans.
    Typed,
}

/// Forwarding controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Bind address of the controller listener (e.g., "0.0.0.0:3002").
    pub bind_address: String,

    /// Deadline for the outbound dispatch and body read, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum inbound body size in bytes.
    pub max_request_bytes: usize,

    /// Maximum buffered downstream body size in bytes.
    pub max_response_bytes: usize,

    /// Typing of query values merged into JSON bodies.
    pub query_values: QueryValues,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3002".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            max_request_bytes: 2 * 1024 * 1024,   // 2MB
            max_response_bytes: 10 * 1024 * 1024, // 10MB
            query_values: QueryValues::String,
        }
    }
}

/// gRPC client definitions keyed by logical name.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GrpcConfig {
    /// Channel connection timeout in seconds.
    pub connect_timeout_secs: u64,

    #[serde(alias = "servers")]
    pub clients: BTreeMap<String, GrpcClientConfig>,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            clients: BTreeMap::new(),
        }
    }
}

/// A single gRPC backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GrpcClientConfig {
    pub host: String,
    pub port: String,

    /// Names of registered handlers wiring this backend into the multiplexer.
    /// `None` means the key was missing, which is a startup error.
    pub handlers: Option<Vec<String>>,

    /// Names of registered interceptors applied to this backend's calls.
    pub interceptors: Vec<String>,
}

impl GrpcClientConfig {
    /// Endpoint URI for the channel.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
