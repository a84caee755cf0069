//! Upstream client and proxy tests
//!
//! Tests for the request helper including:
//! - Envelope unwrapping and raw passthrough
//! - Error mapping (upstream status, malformed JSON, network failure)
//! - Proxy status and body passthrough
//! - Request validation on API routes

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sayariq_backend::{
    create_app, error::AppError, external::SayariqClient, AppState, Config,
};
use serde_json::{json, Value};
use tower::ServiceExt;

#[tokio::test]
async fn test_envelope_data_is_returned() {
    let (url, _) = common::spawn_store(common::seeded_store()).await;
    let client = SayariqClient::with_base_url(url).unwrap();

    let batches: Value = client.get("/lotes").await.unwrap();
    assert_eq!(batches[0]["id"], 10);
}

#[tokio::test]
async fn test_raw_body_passes_through() {
    let (url, _) = common::spawn_store(common::seeded_store()).await;
    let client = SayariqClient::with_base_url(url).unwrap();

    let categories: Value = client.get("/categorias").await.unwrap();
    assert_eq!(categories.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let client = SayariqClient::with_base_url(url).unwrap();

    match client.get_value("/broken").await {
        Err(AppError::Upstream { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_json_is_upstream_error() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let client = SayariqClient::with_base_url(url).unwrap();

    assert!(matches!(
        client.get_value("/malformed").await,
        Err(AppError::Upstream { status: 200, .. })
    ));
}

#[tokio::test]
async fn test_rejected_envelope_carries_message() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let client = SayariqClient::with_base_url(url).unwrap();

    match client.get_value("/rechazado").await {
        Err(AppError::Upstream { message, .. }) => assert_eq!(message, "Lote bloqueado"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SayariqClient::with_base_url(format!("http://{}", addr)).unwrap();
    assert!(matches!(
        client.get_value("/lotes").await,
        Err(AppError::Network(_))
    ));
}

fn app_for(url: String) -> axum::Router {
    let mut config = Config::default();
    config.upstream.base_url = url;
    create_app(AppState::new(config).unwrap())
}

#[tokio::test]
async fn test_proxy_keeps_upstream_status_and_body() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let app = app_for(url);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/eco?x=1")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"monto":"10"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "id": 77, "echo": true }));
}

#[tokio::test]
async fn test_proxy_relays_upstream_failures_unchanged() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let app = app_for(url);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/broken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_proxy_preserves_query_string() {
    let (url, _) = common::spawn_store(common::seeded_store()).await;
    let app = app_for(url);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/proxy/adelantos?productor_id=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    // Proxy does not unwrap the envelope
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_discount_route_uses_configured_rates() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let app = app_for(url);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/descuentos/calcular")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"monto_bruto":"1000","numero_jabas":20}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    let net: rust_decimal::Decimal = serde_json::from_value(body["net_amount"].clone()).unwrap();
    assert_eq!(net, rust_decimal::Decimal::from(825));
}

#[tokio::test]
async fn test_profitability_rejects_half_open_period() {
    let (url, _) = common::spawn_store(common::Store::default()).await;
    let app = app_for(url);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/rentabilidad?desde=2024-01-01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
