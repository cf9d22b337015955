//! End-to-end tests for the forwarding controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use rpc_gateway::config::QueryValues;
use rpc_gateway::relay::{inject, FallbackContext, RelayError};
use rpc_gateway::Relay;

mod common;

use common::{
    client, closed_addr, raw_get, relay_config, start_echo_backend, start_relay, Backend, ECHO_STATUS,
};

async fn relay_for(backend: &Backend) -> String {
    let relay = Relay::from_config(&relay_config(backend.addr));
    start_relay(relay).await
}

/// Parse the echo backend's JSON reply.
async fn echoed(response: reqwest::Response) -> Value {
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

fn echoed_body(echo: &Value) -> Value {
    serde_json::from_str(echo["body"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn get_without_query_forwards_path() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .get(format!("{base}/users/1"))
        .header("content-type", "application/json")
        .header("grpc-metadata-name", "goravel")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.headers()["grpc-metadata-custom-header"], "goravel");

    let echo = echoed(response).await;
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/users/1");
    assert_eq!(echo["query"], Value::Null);
    assert_eq!(echo["body"], "");
    assert_eq!(echo["headers"]["grpc-metadata-name"], "goravel");
}

#[tokio::test]
async fn get_appends_raw_query() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .get(format!("{base}/users?name=goravel&age=18"))
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    assert_eq!(echo["path"], "/users");
    assert_eq!(echo["query"], "name=goravel&age=18");
}

#[tokio::test]
async fn path_and_query_reach_the_gateway_as_sent() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let body = raw_get(&base, "/users/%2e%2e/admin?name=o'brien&age=18").await;

    let echo: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(echo["path"], "/users/%2e%2e/admin");
    assert_eq!(echo["query"], "name=o'brien&age=18");
}

#[tokio::test]
async fn post_json_without_query_is_unchanged() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .post(format!("{base}/users"))
        .header("content-type", "application/json")
        .body(r#"{"name": "goravel", "age": 18}"#)
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["query"], Value::Null);
    assert_eq!(echoed_body(&echo), json!({"name": "goravel", "age": 18}));
}

#[tokio::test]
async fn put_json_merges_query_only_keys() {
    let backend = start_echo_backend().await;
    let mut config = relay_config(backend.addr);
    config.relay.query_values = QueryValues::Typed;
    let base = start_relay(Relay::from_config(&config)).await;

    let response = client()
        .put(format!("{base}/users/1?age=18"))
        .header("content-type", "application/json")
        .body(r#"{"name": "goravel"}"#)
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    assert_eq!(echo["method"], "PUT");
    // Non-GET requests carry the query in the body only.
    assert_eq!(echo["query"], Value::Null);

    let body = echoed_body(&echo);
    assert_eq!(body, json!({"name": "goravel", "age": 18}));
    let sent_len = serde_json::to_vec(&body).unwrap().len().to_string();
    assert_eq!(echo["headers"]["content-length"], sent_len.as_str());
}

#[tokio::test]
async fn json_body_fields_win_over_query() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .patch(format!("{base}/users/1?name=query&age=18"))
        .header("content-type", "application/json")
        .body(r#"{"name": "goravel"}"#)
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    assert_eq!(echo["method"], "PATCH");
    assert_eq!(echoed_body(&echo), json!({"name": "goravel", "age": "18"}));
}

#[tokio::test]
async fn delete_with_empty_json_body_merges_query() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .delete(format!("{base}/users/1?age=18"))
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    assert_eq!(echo["method"], "DELETE");
    assert_eq!(echoed_body(&echo), json!({"age": "18"}));
}

#[tokio::test]
async fn form_body_merges_query_only_keys() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .post(format!("{base}/users?age=18&name=query"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("name=goravel")
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    let pairs: Vec<(String, String)> =
        url::form_urlencoded::parse(echo["body"].as_str().unwrap().as_bytes())
            .into_owned()
            .collect();
    assert_eq!(
        pairs,
        vec![
            ("name".to_string(), "goravel".to_string()),
            ("age".to_string(), "18".to_string()),
        ]
    );
}

#[tokio::test]
async fn other_content_types_are_forwarded_byte_for_byte() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;
    let raw = "  <user name=\"goravel\" />\n";

    let response = client()
        .post(format!("{base}/users"))
        .header("content-type", "application/xml")
        .body(raw)
        .send()
        .await
        .unwrap();

    let echo = echoed(response).await;
    assert_eq!(echo["body"], raw);
    assert_eq!(echo["headers"]["content-type"], "application/xml");
}

#[tokio::test]
async fn downstream_errors_are_relayed_with_status_200() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client()
        .get(format!("{base}/users/404"))
        .header(ECHO_STATUS, "500")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK.as_u16());
    assert_eq!(response.headers()["content-type"], "application/json");
    let echo: Value = response.json().await.unwrap();
    assert_eq!(echo["path"], "/users/404");
}

#[tokio::test]
async fn malformed_json_invokes_fallback_once_without_dispatch() {
    let backend = start_echo_backend().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let relay = Relay::from_config(&relay_config(backend.addr))
        .with_fallback(move |ctx: &FallbackContext, err: &RelayError| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(matches!(err, RelayError::Json(_)));
            assert_eq!(ctx.path, "/users");
            (StatusCode::OK, "fallback").into_response()
        });
    let base = start_relay(relay).await;

    let response = client()
        .post(format!("{base}/users"))
        .header("content-type", "application/json")
        .body(r#"{"name": "#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "fallback");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn oversized_request_body_invokes_fallback_without_dispatch() {
    let backend = start_echo_backend().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut config = relay_config(backend.addr);
    config.relay.max_request_bytes = 16;
    let relay = Relay::from_config(&config).with_fallback(
        move |_ctx: &FallbackContext, err: &RelayError| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(matches!(err, RelayError::ReadBody(_)));
            (StatusCode::OK, "body too large").into_response()
        },
    );
    let base = start_relay(relay).await;

    let response = client()
        .post(format!("{base}/users"))
        .header("content-type", "application/json")
        .body(json!({"name": "goravel", "bio": "x".repeat(64)}).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "body too large");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn unreachable_gateway_uses_default_fallback() {
    let base = start_relay(Relay::from_config(&relay_config(closed_addr().await))).await;

    let response = client().get(format!("{base}/users/1")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"]["code"], 500);
    assert!(body["status"]["error"]
        .as_str()
        .unwrap()
        .starts_with("gateway request failed"));
}

#[tokio::test]
async fn slow_gateway_times_out() {
    let backend = start_echo_backend().await;
    let mut config = relay_config(backend.addr);
    config.relay.timeout_secs = 1;
    let base = start_relay(Relay::from_config(&config)).await;

    let response = client().get(format!("{base}/slow")).send().await.unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"]["error"], "gateway request timed out after 1s");
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let backend = start_echo_backend().await;
    let mut config = relay_config(backend.addr);
    config.relay.max_response_bytes = 1024;
    let base = start_relay(Relay::from_config(&config)).await;

    let response = client().get(format!("{base}/large")).send().await.unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"]["error"], "gateway response exceeds 1024 bytes");
}

#[tokio::test]
async fn request_id_is_generated_and_propagated() {
    let backend = start_echo_backend().await;
    let base = relay_for(&backend).await;

    let response = client().get(format!("{base}/users/1")).send().await.unwrap();

    let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(!request_id.is_empty());
    let echo = echoed(response).await;
    assert_eq!(echo["headers"]["x-request-id"], request_id.as_str());
}

async fn inject_user(mut request: Request<Body>, next: Next) -> Response {
    if let Err(e) = inject(&mut request, "user_id", 2) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    next.run(request).await
}

#[tokio::test]
async fn injected_values_reach_the_gateway() {
    let backend = start_echo_backend().await;
    let relay = Relay::from_config(&relay_config(backend.addr));
    let base = format!(
        "http://{}",
        common::serve(relay.router().layer(middleware::from_fn(inject_user))).await
    );

    let get = client()
        .get(format!("{base}/users?name=goravel"))
        .send()
        .await
        .unwrap();
    assert_eq!(echoed(get).await["query"], "name=goravel&user_id=2");

    let post = client()
        .post(format!("{base}/users"))
        .header("content-type", "application/json")
        .body(r#"{"name": "goravel", "age": 18}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(
        echoed_body(&echoed(post).await),
        json!({"name": "goravel", "age": 18, "user_id": "2"})
    );
}
