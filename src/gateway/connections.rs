//! gRPC client connections keyed by logical backend name.
//!
//! Channels connect lazily on the first call and are cached for the life of
//! the process; building the pool never blocks on the network.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use tonic::service::Interceptor;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::config::GrpcClientConfig;
use crate::gateway::error::GatewayError;
use crate::gateway::registry::{HandlerRegistry, InterceptorFn};

/// Interceptors of one backend, applied in configured order.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<InterceptorFn>,
}

impl InterceptorChain {
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl Interceptor for InterceptorChain {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        for interceptor in &self.interceptors {
            request = interceptor(request)?;
        }
        Ok(request)
    }
}

/// A backend's channel plus its interceptors.
///
/// Handlers build their generated clients from this, e.g.
/// `UserServiceClient::with_interceptor(conn.channel(), conn.interceptor())`.
#[derive(Clone)]
pub struct GrpcConnection {
    name: String,
    channel: Channel,
    interceptors: InterceptorChain,
}

impl GrpcConnection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    pub fn interceptor(&self) -> InterceptorChain {
        self.interceptors.clone()
    }
}

/// Cache of connections, one per backend name.
pub struct ConnectionPool {
    connect_timeout: Duration,
    connections: HashMap<String, GrpcConnection>,
}

impl ConnectionPool {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            connections: HashMap::new(),
        }
    }

    /// Return the cached connection for `name`, creating it on first use.
    pub fn connect(
        &mut self,
        name: &str,
        client: &GrpcClientConfig,
        registry: &HandlerRegistry,
    ) -> Result<&GrpcConnection, GatewayError> {
        match self.connections.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let connection = open(self.connect_timeout, name, client, registry)?;
                tracing::debug!(
                    client = name,
                    endpoint = %client.endpoint(),
                    interceptors = connection.interceptors.len(),
                    "gRPC channel created"
                );
                Ok(entry.insert(connection))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&GrpcConnection> {
        self.connections.get(name)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

fn open(
    connect_timeout: Duration,
    name: &str,
    client: &GrpcClientConfig,
    registry: &HandlerRegistry,
) -> Result<GrpcConnection, GatewayError> {
    let interceptors = client
        .interceptors
        .iter()
        .map(|interceptor| {
            registry
                .interceptor(interceptor)
                .cloned()
                .ok_or_else(|| GatewayError::UnknownInterceptor {
                    client: name.to_string(),
                    interceptor: interceptor.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let channel = Endpoint::from_shared(client.endpoint())
        .map_err(|source| GatewayError::Connect {
            name: name.to_string(),
            source,
        })?
        .connect_timeout(connect_timeout)
        .connect_lazy();

    Ok(GrpcConnection {
        name: name.to_string(),
        channel,
        interceptors: InterceptorChain { interceptors },
    })
}
