//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and the gRPC
//! client table. All errors are collected, not just the first.

use std::fmt;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gateway.scheme != "http" {
        errors.push(ValidationError::new(
            "gateway.scheme",
            format!("unsupported scheme {:?}", config.gateway.scheme),
        ));
    }

    let relay = &config.relay;
    if relay.timeout_secs == 0 {
        errors.push(ValidationError::new("relay.timeout_secs", "must be greater than 0"));
    }
    if relay.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "relay.connect_timeout_secs",
            "must be greater than 0",
        ));
    }
    if relay.max_request_bytes == 0 {
        errors.push(ValidationError::new("relay.max_request_bytes", "must be greater than 0"));
    }
    if relay.max_response_bytes == 0 {
        errors.push(ValidationError::new("relay.max_response_bytes", "must be greater than 0"));
    }

    if config.grpc.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "grpc.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    // Handler lists are checked by the gateway server at startup.
    if config.grpc.clients.keys().any(String::is_empty) {
        errors.push(ValidationError::new("grpc.clients", "gRPC client name is required"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
