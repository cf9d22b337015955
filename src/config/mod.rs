//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, GATEWAY_HOST / GATEWAY_PORT overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed by value to the relay and the gateway server
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Functions (fallback, handlers, interceptors) are not config; they are
//!   supplied in code

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayAddress;
pub use schema::GatewayConfig;
pub use schema::GrpcClientConfig;
pub use schema::QueryValues;
pub use schema::RelayConfig;
