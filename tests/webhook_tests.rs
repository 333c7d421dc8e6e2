//! End-to-end tests for the webhook relay: provider field-name variants,
//! forwarding to the confirmation endpoint, idempotent application and
//! wallet crediting. These run against a live listener because the relay
//! forwards over real HTTP.

use pixgate::config::Config;
use std::sync::Arc;

async fn spawn_live_app() -> (String, Arc<pixgate::api::AppState>) {
    let db_path =
        std::env::temp_dir().join(format!("pixgate-webhook-test-{}.db", uuid::Uuid::new_v4()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    // The relay forwards to this same process
    config.provider.confirm_url = format!("http://{addr}/api/transactions/confirm");

    let state = pixgate::state::create_app_state(config)
        .await
        .expect("Failed to create app state");

    let app = pixgate::api::router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn test_field_name_variants_produce_one_confirmation() {
    let (base, state) = spawn_live_app().await;
    let client = reqwest::Client::new();

    // PascalCase variant first
    let response = client
        .post(format!("{base}/api/webhooks/cashin"))
        .json(&serde_json::json!({"ExternalId": "wh-1", "Value": 1000}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let tx = state
        .store
        .get_transaction_by_external_id("wh-1")
        .await
        .unwrap()
        .expect("transaction should exist after relay");
    assert_eq!(tx.status, "confirmed");
    assert_eq!(tx.amount_cents, 1000);
    let first_confirmed_at = tx.confirmed_at.clone();

    // camelCase variant of the same payload: same normalization, and the
    // confirmation applies nothing the second time
    let response = client
        .post(format!("{base}/api/webhooks/cashin"))
        .json(&serde_json::json!({"externalId": "wh-1", "value": 1000}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let tx = state
        .store
        .get_transaction_by_external_id("wh-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "confirmed");
    assert_eq!(tx.amount_cents, 1000);
    assert_eq!(tx.confirmed_at, first_confirmed_at);
}

#[tokio::test]
async fn test_confirmed_callback_credits_pending_transaction() {
    let (base, state) = spawn_live_app().await;
    let client = reqwest::Client::new();

    // Pending transaction owned by the seeded owner (user 1)
    state
        .store
        .create_pending_transaction(1, "dep-1", 5000, "BRL", Some("Payer"), Some("12345678900"))
        .await
        .unwrap();

    let response = client
        .post(format!("{base}/api/webhooks/cashin"))
        .json(&serde_json::json!({"ExternalId": "dep-1", "Value": 5000, "Status": "PAID"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let wallet = state.store.get_or_create_wallet(1).await.unwrap();
    assert_eq!(wallet.brl_cents, 5000);
    assert_eq!(wallet.total_deposited_cents, 5000);
    assert_eq!(wallet.total_withdrawn_cents, 0);

    // Replaying the callback does not double-credit
    let response = client
        .post(format!("{base}/api/webhooks/cashin"))
        .json(&serde_json::json!({"externalId": "dep-1", "value": 5000, "status": "PAID"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let wallet = state.store.get_or_create_wallet(1).await.unwrap();
    assert_eq!(wallet.brl_cents, 5000);
    assert_eq!(wallet.total_deposited_cents, 5000);
}

#[tokio::test]
async fn test_failed_callback_marks_transaction_without_credit() {
    let (base, state) = spawn_live_app().await;
    let client = reqwest::Client::new();

    state
        .store
        .create_pending_transaction(1, "fail-1", 2500, "BRL", None, None)
        .await
        .unwrap();

    let response = client
        .post(format!("{base}/api/webhooks/cashin"))
        .json(&serde_json::json!({"ExternalId": "fail-1", "Value": 2500, "Status": "CANCELED"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let tx = state
        .store
        .get_transaction_by_external_id("fail-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "failed");
    assert!(tx.confirmed_at.is_none());

    let wallet = state.store.get_or_create_wallet(1).await.unwrap();
    assert_eq!(wallet.brl_cents, 0);
}

#[tokio::test]
async fn test_test_webhook_flows_through_relay() {
    let (base, state) = spawn_live_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/test-webhook"))
        .json(&serde_json::json!({"amountCents": 777}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let external_id = body["data"]["externalId"].as_str().unwrap();
    assert!(external_id.starts_with("test-"));

    let tx = state
        .store
        .get_transaction_by_external_id(external_id)
        .await
        .unwrap()
        .expect("synthesized callback should land as a transaction");
    assert_eq!(tx.amount_cents, 777);
    assert_eq!(tx.status, "confirmed");

    // Relay diagnostics land in the ring buffer
    let entries = state.debug_log.snapshot();
    assert!(
        entries
            .iter()
            .any(|e| e.context == "test-webhook" || e.context == "webhook")
    );
}

#[tokio::test]
async fn test_confirm_endpoint_is_idempotent() {
    let (base, state) = spawn_live_app().await;
    let client = reqwest::Client::new();

    state
        .store
        .create_pending_transaction(1, "conf-1", 100, "BRL", None, None)
        .await
        .unwrap();

    let confirmation = serde_json::json!({
        "externalId": "conf-1",
        "status": "confirmed",
        "amountCents": 100,
        "currency": "BRL"
    });

    let body: serde_json::Value = client
        .post(format!("{base}/api/transactions/confirm"))
        .json(&confirmation)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["applied"], true);

    let body: serde_json::Value = client
        .post(format!("{base}/api/transactions/confirm"))
        .json(&confirmation)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["applied"], false);
}
