//! API integration tests.
//!
//! These verify the complete HTTP flow end-to-end using axum's test
//! utilities over the in-process transport.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use chat_bridge::api::{create_router, AppState};
use chat_bridge::security::{ApiTokenStore, AuthConfig};
use chat_bridge::{
    CredStore, ManagerConfig, MemoryBehavior, MemoryTransport, SessionManager,
};

struct TestApp {
    app: Router,
    transport: Arc<MemoryTransport>,
    _tmp: TempDir,
}

fn test_app(behavior: MemoryBehavior, tokens: ApiTokenStore) -> TestApp {
    let tmp = TempDir::new().unwrap();
    let transport = Arc::new(MemoryTransport::with_behavior(behavior));
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&transport) as _,
        CredStore::new(tmp.path()),
        ManagerConfig {
            qr_wait: Duration::from_secs(2),
            qr_poll: Duration::from_millis(10),
            ..Default::default()
        },
    ));

    TestApp {
        app: create_router(AppState::new(manager), Arc::new(tokens)),
        transport,
        _tmp: tmp,
    }
}

fn open_app() -> TestApp {
    test_app(MemoryBehavior::default(), ApiTokenStore::disabled())
}

/// Helper to create a JSON request.
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract body as bytes.
async fn response_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Helper to extract JSON from response.
async fn response_json(response: axum::response::Response) -> Value {
    let body = response_bytes(response).await;
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

// ============================================================================
// Health & Auth
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_bytes(response).await, b"OK");
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let tokens = ApiTokenStore::new(AuthConfig::default());
    tokens.add_token("secret");
    let t = test_app(MemoryBehavior::default(), tokens);

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/sessions", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let tokens = ApiTokenStore::new(AuthConfig::default());
    tokens.add_token("secret");
    let t = test_app(MemoryBehavior::default(), tokens);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/sessions")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_accepted() {
    let tokens = ApiTokenStore::new(AuthConfig::default());
    tokens.add_token("secret");
    let t = test_app(MemoryBehavior::default(), tokens);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/sessions")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_skips_auth() {
    let tokens = ApiTokenStore::new(AuthConfig::default());
    tokens.add_token("secret");
    let t = test_app(MemoryBehavior::default(), tokens);

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Session management
// ============================================================================

#[tokio::test]
async fn test_create_session() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["id"], "tenant-a");
}

#[tokio::test]
async fn test_duplicate_create_returns_400() {
    let t = open_app();

    let first = t
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = t
        .app
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let json = response_json(second).await;
    assert_eq!(json["code"], "SESSION_EXISTS");
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_create_session_invalid_id() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "../escape"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["code"], "INVALID_SESSION_ID");
}

#[tokio::test]
async fn test_status_unknown_session() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/session/ghost/status", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_reports_real_state() {
    let t = test_app(MemoryBehavior::silent(), ApiTokenStore::disabled());

    t.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/session/tenant-a/status", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["id"], "tenant-a");
    assert_eq!(json["connected"], false);
    assert_eq!(json["state"], "Connecting");
}

#[tokio::test]
async fn test_list_sessions() {
    let t = open_app();

    let empty = t
        .app
        .clone()
        .oneshot(json_request(Method::GET, "/sessions", None))
        .await
        .unwrap();
    let json = response_json(empty).await;
    assert_eq!(json["sessions"], json!([]));

    t.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    let listed = t
        .app
        .oneshot(json_request(Method::GET, "/sessions", None))
        .await
        .unwrap();
    let json = response_json(listed).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["sessions"], json!(["tenant-a"]));
}

#[tokio::test]
async fn test_delete_session() {
    let t = open_app();

    t.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(json_request(Method::DELETE, "/session/tenant-a", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["success"], true);

    // Gone from both listing and status
    let status = t
        .app
        .clone()
        .oneshot(json_request(Method::GET, "/session/tenant-a/status", None))
        .await
        .unwrap();
    assert_eq!(status.status(), StatusCode::NOT_FOUND);

    let again = t
        .app
        .oneshot(json_request(Method::DELETE, "/session/tenant-a", None))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Pairing codes
// ============================================================================

#[tokio::test]
async fn test_qr_returns_png() {
    let t = open_app();

    t.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/session/tenant-a/qr", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let body = response_bytes(response).await;
    assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_qr_unknown_session() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/session/ghost/qr", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_qr_not_available() {
    let t = test_app(MemoryBehavior::silent(), ApiTokenStore::disabled());

    t.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/session/tenant-a/qr", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_qr_html_page() {
    let t = open_app();

    t.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/create",
            Some(json!({"id": "tenant-a"})),
        ))
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/session/tenant-a/qr-html", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(response_bytes(response).await).unwrap();
    assert!(body.contains("data:image/png;base64,"));
    assert!(body.contains("tenant-a"));
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_send_message() {
    let t = test_app(MemoryBehavior::silent(), ApiTokenStore::disabled());

    let response = t
        .app
        .oneshot(json_request(
            Method::POST,
            "/message/send",
            Some(json!({
                "sessionId": "tenant-a",
                "to": "+1 (555) 123-4567",
                "text": "hello"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["messageId"].as_str().unwrap().starts_with("3EB0"));

    let sent = t.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "15551234567@s.whatsapp.net");
}

#[tokio::test]
async fn test_send_message_protocol_failure() {
    let t = test_app(
        MemoryBehavior {
            fail_send: true,
            ..MemoryBehavior::silent()
        },
        ApiTokenStore::disabled(),
    );

    let response = t
        .app
        .oneshot(json_request(
            Method::POST,
            "/message/send",
            Some(json!({
                "sessionId": "tenant-a",
                "to": "5551234",
                "text": "doomed"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = response_json(response).await;
    assert_eq!(json["code"], "PROTOCOL_ERROR");
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test]
async fn test_invalid_json_body() {
    let t = open_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/session/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ invalid json }"))
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_not_found_route() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(Method::GET, "/nonexistent", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let t = open_app();

    let response = t
        .app
        .oneshot(json_request(Method::PUT, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
