//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use rpc_gateway::config::GatewayConfig;
use rpc_gateway::Relay;

/// Request header selecting the status the echo backend answers with.
pub const ECHO_STATUS: &str = "x-echo-status";

/// A running echo backend.
pub struct Backend {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl Backend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a backend that echoes every request as JSON:
/// `{"method", "path", "query", "body", "headers"}`.
///
/// `/slow` sleeps for three seconds first; `/large` returns 4096 bytes.
pub async fn start_echo_backend() -> Backend {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/", any(echo))
        .route("/{*path}", any(echo))
        .with_state(hits.clone());

    let addr = serve(app).await;
    Backend { addr, hits }
}

async fn echo(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    match uri.path() {
        "/slow" => tokio::time::sleep(Duration::from_secs(3)).await,
        "/large" => return "x".repeat(4096).into_response(),
        _ => {}
    }

    let status = headers
        .get(ECHO_STATUS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let echoed_headers: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value.to_str().unwrap_or_default())))
        .collect();

    let echoed = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "body": String::from_utf8_lossy(&body),
        "headers": echoed_headers,
    });

    (
        status,
        [
            ("grpc-metadata-custom-header", "goravel"),
            ("content-type", "text/plain"),
        ],
        echoed.to_string(),
    )
        .into_response()
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Configuration pointing the relay at `backend`.
pub fn relay_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.gateway.host = backend.ip().to_string();
    config.gateway.port = backend.port().to_string();
    config
}

/// Serve `relay` and return its base URL.
pub async fn start_relay(relay: Relay) -> String {
    let addr = serve(relay.router()).await;
    format!("http://{addr}")
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Send a GET whose request target is written verbatim on the request line,
/// bypassing client-side URL normalization. Returns the response body.
pub async fn raw_get(base: &str, target: &str) -> String {
    let addr = base.trim_start_matches("http://");
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8(response).unwrap();
    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    assert!(head.starts_with("HTTP/1.1 200"), "unexpected response: {head}");
    body.to_string()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
