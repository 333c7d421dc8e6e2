use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::webhook::{ProviderCallback, TransactionConfirmation};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedResponse {
    pub external_id: String,
    pub status: String,
}

/// POST /api/webhooks/cashin
/// Raw provider callback. Field-name variants (`externalId`/`ExternalId`,
/// `value`/`Value`, ...) deserialize into one shape before the relay runs,
/// so every variant of the same payload produces the same confirmation call.
pub async fn provider_callback(
    State(state): State<Arc<AppState>>,
    Json(callback): Json<ProviderCallback>,
) -> Result<Json<ApiResponse<RelayedResponse>>, ApiError> {
    relay(&state, callback).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWebhookRequest {
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// POST /api/test-webhook
/// Synthesizes a provider callback and pushes it through the same relay path
/// as the real webhook; the manual test harness for payment confirmation.
pub async fn test_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TestWebhookRequest>,
) -> Result<Json<ApiResponse<RelayedResponse>>, ApiError> {
    let callback = ProviderCallback {
        external_id: payload
            .external_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("test-{}", uuid::Uuid::new_v4())),
        status: payload.status,
        amount_cents: payload.amount_cents.unwrap_or(1000),
        currency: None,
        payer_name: Some("Test Payer".to_string()),
        payer_document: None,
    };

    state
        .debug_log
        .push("test-webhook", format!("synthesized callback {}", callback.external_id));

    relay(&state, callback).await
}

async fn relay(
    state: &AppState,
    callback: ProviderCallback,
) -> Result<Json<ApiResponse<RelayedResponse>>, ApiError> {
    let confirmation = state
        .relay
        .relay(callback)
        .await
        .map_err(|e| ApiError::relay_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(RelayedResponse {
        external_id: confirmation.external_id,
        status: confirmation.status.as_str().to_string(),
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub external_id: String,
    pub applied: bool,
}

/// POST /api/transactions/confirm
/// Internal confirmation endpoint the relay forwards to. Applies the
/// normalized confirmation idempotently by external id and credits the
/// owning wallet on a confirmed deposit.
pub async fn confirm_transaction(
    State(state): State<Arc<AppState>>,
    Json(confirmation): Json<TransactionConfirmation>,
) -> Result<Json<ApiResponse<ConfirmResponse>>, ApiError> {
    if confirmation.external_id.is_empty() {
        return Err(ApiError::validation("externalId is required"));
    }

    let outcome = state
        .store
        .confirm_transaction(&confirmation)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to confirm transaction: {e}")))?;

    if outcome.applied {
        tracing::info!(
            external_id = %confirmation.external_id,
            status = confirmation.status.as_str(),
            "Transaction confirmation applied"
        );
    }

    Ok(Json(ApiResponse::success(ConfirmResponse {
        external_id: confirmation.external_id,
        applied: outcome.applied,
    })))
}
