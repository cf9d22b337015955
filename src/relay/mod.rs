//! HTTP-to-gateway relay.
//!
//! Proxies REST-style requests to the separately running gateway listener,
//! merging query parameters into bodies and always answering 200 with the
//! relayed body.

pub mod client;
pub mod controller;
pub mod error;
pub mod fallback;
pub mod inject;
pub mod transform;
pub mod writer;

pub use controller::Relay;
pub use error::RelayError;
pub use fallback::{default_fallback, Fallback, FallbackContext};
pub use inject::inject;
