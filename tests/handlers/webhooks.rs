//! Tests for POST /webhook/hotmart.
//!
//! The platform only looks at the status code: 200 acknowledges, anything
//! else is redelivered later.

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "../common/mod.rs"]
mod common;
use common::*;
use ledgerbridge::error::msg;

fn webhook_request(body: impl Into<Body>, hottok: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/hotmart")
        .header("content-type", "application/json");
    if let Some(token) = hottok {
        builder = builder.header("X-HOTMART-HOTTOK", token);
    }
    builder.body(body.into()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn mount_accounting_happy_path(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "cust-1"}])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "svc-1"}])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sale-1"})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_non_purchase_event_is_acknowledged_without_calls() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state(&server, &db));

    let body = webhook_body("PURCHASE_CANCELED", json!({"anything": true}));
    let response = app
        .oneshot(webhook_request(body.to_string(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, msg::EVENT_IGNORED);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_completed_purchase_is_reconciled() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    seed_credential(&db, "access-1", "refresh-1", 3600);
    mount_accounting_happy_path(&server).await;
    let app = app(create_test_app_state(&server, &db));

    let body = webhook_body("PURCHASE_COMPLETE", purchase_data());
    let response = app
        .oneshot(webhook_request(body.to_string(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, msg::WEBHOOK_PROCESSED);
}

#[tokio::test]
async fn test_malformed_json_returns_bad_request() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state(&server, &db));

    let response = app
        .oneshot(webhook_request("{ not json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, msg::INVALID_JSON);
}

#[tokio::test]
async fn test_purchase_with_wrong_shape_returns_bad_request() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    seed_credential(&db, "access-1", "refresh-1", 3600);
    let app = app(create_test_app_state(&server, &db));

    let body = webhook_body("PURCHASE_COMPLETE", json!({"buyer": {"name": "No Purchase"}}));
    let response = app
        .oneshot(webhook_request(body.to_string(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, msg::INVALID_PURCHASE);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reconciliation_failure_returns_server_error() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    seed_credential(&db, "access-1", "refresh-1", 3600);
    Mock::given(method("GET"))
        .and(path("/v1/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "cust-1"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "svc-1"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sales"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid sale"))
        .mount(&server)
        .await;
    let app = app(create_test_app_state(&server, &db));

    let body = webhook_body("PURCHASE_COMPLETE", purchase_data());
    let response = app
        .oneshot(webhook_request(body.to_string(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, msg::WEBHOOK_FAILED);
}

#[tokio::test]
async fn test_missing_credential_returns_server_error() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state(&server, &db));

    let body = webhook_body("PURCHASE_COMPLETE", purchase_data());
    let response = app
        .oneshot(webhook_request(body.to_string(), None))
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::INTERNAL_SERVER_ERROR,
        "purchase must be redelivered once the handshake is done"
    );
}

// ============ Hottok ============

#[tokio::test]
async fn test_wrong_hottok_is_rejected() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state_with_hottok(&server, &db));

    let body = webhook_body("PURCHASE_COMPLETE", purchase_data());
    let response = app
        .oneshot(webhook_request(body.to_string(), Some("not-the-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_hottok_is_rejected_when_configured() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state_with_hottok(&server, &db));

    let body = webhook_body("PURCHASE_CANCELED", Value::Null);
    let response = app
        .oneshot(webhook_request(body.to_string(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, msg::INVALID_HOTTOK);
}

#[tokio::test]
async fn test_matching_hottok_is_accepted() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state_with_hottok(&server, &db));

    let body = webhook_body("PURCHASE_CANCELED", Value::Null);
    let response = app
        .oneshot(webhook_request(body.to_string(), Some(HOTTOK)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============ Health ============

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let db = setup_test_db();
    let app = app(create_test_app_state(&server, &db));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}
