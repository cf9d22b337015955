//! Named handler and interceptor functions.
//!
//! Config files name handlers and interceptors; the application registers
//! the functions behind those names before the gateway starts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::Router;
use tonic::{Request, Status};

use crate::gateway::connections::GrpcConnection;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wires a backend's endpoints into the multiplexer.
pub type Handler = Arc<dyn Fn(Router, &GrpcConnection) -> Result<Router, BoxError> + Send + Sync>;

/// Runs on every outbound call of a backend. Returning a `Status` cancels
/// the call.
pub type InterceptorFn = Arc<dyn Fn(Request<()>) -> Result<Request<()>, Status> + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
    interceptors: HashMap<String, InterceptorFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Router, &GrpcConnection) -> Result<Router, BoxError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn register_interceptor<F>(&mut self, name: impl Into<String>, interceptor: F) -> &mut Self
    where
        F: Fn(Request<()>) -> Result<Request<()>, Status> + Send + Sync + 'static,
    {
        self.interceptors.insert(name.into(), Arc::new(interceptor));
        self
    }

    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn interceptor(&self, name: &str) -> Option<&InterceptorFn> {
        self.interceptors.get(name)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        let mut interceptors: Vec<_> = self.interceptors.keys().collect();
        handlers.sort();
        interceptors.sort();

        f.debug_struct("HandlerRegistry")
            .field("handlers", &handlers)
            .field("interceptors", &interceptors)
            .finish()
    }
}
