//! Observability.
//!
//! Every subsystem logs through `tracing` with structured fields; request
//! ids (`x-request-id`) are attached by the relay router and appear in its
//! relay and fallback events.

pub mod logging;
