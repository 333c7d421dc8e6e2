//! Integration tests for dashboard auth, PIX balance, admin flows and
//! API-key management.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use pixgate::config::Config;
use pixgate::domain::{Role, UserStatus};
use std::sync::Arc;
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20260302_initial.rs)
const DEFAULT_API_KEY: &str = "pixgate_default_api_key_please_regenerate";

const OWNER_EMAIL: &str = "owner@pixgate.local";
const OWNER_PASSWORD: &str = "password";

async fn spawn_app() -> (Arc<pixgate::api::AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("pixgate-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;

    let state = pixgate::state::create_app_state(config)
        .await
        .expect("Failed to create app state");

    (state.clone(), pixgate::api::router(state))
}

fn session_cookie(response: &axum::http::Response<Body>, name: &str) -> String {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(name))
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
        .expect("session cookie missing from response")
}

async fn login(app: &Router, path: &str, email: &str, password: &str) -> (StatusCode, Option<String>) {
    let cookie_name = if path.contains("backoffice") {
        "backoffice-auth-token"
    } else {
        "auth-token"
    };

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"email": email, "password": password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let cookie = (status == StatusCode::OK).then(|| session_cookie(&response, cookie_name));
    (status, cookie)
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_state, app) = spawn_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_endpoints_require_auth() {
    let (_state, app) = spawn_app().await;

    for uri in ["/api/pix/balance", "/api/auth/me", "/api/keys"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert!(body.get("data").is_none());
    }
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (_state, app) = spawn_app().await;

    let (status, _) = login(&app, "/api/auth/login", OWNER_EMAIL, "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "/api/auth/login", "nobody@example.com", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_balance_lazily_creates_zeroed_wallet() {
    let (_state, app) = spawn_app().await;

    let (status, cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/pix/balance")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["balance"]["brlAmount"], 0);
    assert_eq!(body["data"]["balance"]["totalDeposited"], 0);
    assert_eq!(body["data"]["balance"]["totalWithdrawn"], 0);
}

#[tokio::test]
async fn test_session_test_reports_authentication() {
    let (_state, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["authenticated"], false);

    let (_, cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/test")
                .header("Cookie", cookie.unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["identity"]["email"], OWNER_EMAIL);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (_state, app) = spawn_app().await;

    let (_, cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;
    let cookie = cookie.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/pix/balance")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pending_account_cannot_login_until_approved() {
    let (state, app) = spawn_app().await;

    let user = state
        .store
        .create_user(
            "newseller@example.com",
            "New Seller",
            "hunter22222",
            Role::Seller,
            UserStatus::Pending,
            &state.config.security,
        )
        .await
        .unwrap();

    let (status, _) = login(&app, "/api/auth/login", "newseller@example.com", "hunter22222").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Owner approves through the admin endpoint
    let (_, owner_cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/users/{}/approve", user.id))
                .header("Cookie", owner_cookie.unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "approved");

    let (status, _) = login(&app, "/api/auth/login", "newseller@example.com", "hunter22222").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_endpoints_require_admin_role() {
    let (state, app) = spawn_app().await;

    state
        .store
        .create_user(
            "plain@example.com",
            "Plain User",
            "hunter22222",
            Role::User,
            UserStatus::Approved,
            &state.config.security,
        )
        .await
        .unwrap();

    let (_, cookie) = login(&app, "/api/auth/login", "plain@example.com", "hunter22222").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/users")
                .header("Cookie", cookie.unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_ADMIN");
}

#[tokio::test]
async fn test_admin_can_list_users() {
    let (_state, app) = spawn_app().await;

    let (_, cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/users")
                .header("Cookie", cookie.unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["email"], OWNER_EMAIL);
}

#[tokio::test]
async fn test_api_key_lifecycle() {
    let (_state, app) = spawn_app().await;

    let (_, cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;
    let cookie = cookie.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/keys")
                .header("Cookie", &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "label": "integration",
                        "scopes": ["payments:*"]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let key_material = body["data"]["key"].as_str().unwrap().to_string();
    let key_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(key_material.len(), 64);

    // Listing never repeats the key material
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/keys")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let listed = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|k| k["id"].as_i64() == Some(key_id))
        .unwrap();
    assert!(listed.get("key").is_none());
    assert_eq!(listed["keyPrefix"].as_str().unwrap().len(), 8);

    // The wildcard scope reaches the merchant surface: scope passes, and the
    // request fails on payload validation instead of authorization
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/cashin")
                .header("X-Api-Key", &key_material)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "amountCents": 0,
                        "payerName": "x",
                        "payerDocument": "y"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Revoke, then the key stops authenticating
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/keys/{key_id}"))
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/cashin")
                .header("X-Api-Key", &key_material)
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_API_KEY");
}

#[tokio::test]
async fn test_create_key_validation() {
    let (_state, app) = spawn_app().await;

    let (_, cookie) = login(&app, "/api/auth/login", OWNER_EMAIL, OWNER_PASSWORD).await;
    let cookie = cookie.unwrap();

    let cases = [
        serde_json::json!({"label": "k", "scopes": []}),
        serde_json::json!({"label": "k", "scopes": ["Payments:Read"]}),
        serde_json::json!({"label": "", "scopes": ["payments:read"]}),
        serde_json::json!({"label": "k", "scopes": ["payments:read"], "allowedIps": ["not-an-ip"]}),
        serde_json::json!({"label": "k", "scopes": ["payments:read"], "expiresAt": "tomorrow"}),
    ];

    for payload in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/keys")
                    .header("Cookie", &cookie)
                    .header("Content-Type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_merchant_rejections_are_distinct() {
    let (state, app) = spawn_app().await;

    // No key at all
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/payments/balance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_API_KEY");

    // Unknown key
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/payments/balance")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_API_KEY");

    // Seeded key carries payments:read only; write is a scope rejection
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/cashin")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "amountCents": 1000,
                        "payerName": "x",
                        "payerDocument": "y"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "MISSING_SCOPE");

    // Expired key
    let expired = state
        .store
        .create_api_key(
            1,
            "expired",
            &["payments:read".to_string()],
            &[],
            Some("2020-01-01T00:00:00+00:00".to_string()),
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/payments/balance")
                .header("X-Api-Key", &expired.key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "KEY_EXPIRED");

    // IP-restricted key
    let restricted = state
        .store
        .create_api_key(
            1,
            "restricted",
            &["payments:*".to_string()],
            &["10.0.0.1".to_string()],
            None,
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/payments/balance")
                .header("X-Api-Key", &restricted.key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "IP_NOT_ALLOWED");

    // Allowed caller IP gets past the gate and fails on payload validation
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/cashin")
                .header("X-Api-Key", &restricted.key)
                .header("x-forwarded-for", "10.0.0.1")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "amountCents": 0,
                        "payerName": "x",
                        "payerDocument": "y"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
