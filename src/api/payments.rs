use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::keys::AuthorizedKey;
use super::{ApiError, ApiResponse, AppState};
use crate::clients::provider::{CashinCharge, CashinRequest, ProviderBalance};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCashinRequest {
    /// Charge amount in integer BRL cents
    pub amount_cents: i64,

    pub payer_name: String,

    pub payer_document: String,

    /// Optional caller-supplied correlation id; generated when absent
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashinResponse {
    pub external_id: String,
    pub charge: CashinCharge,
}

/// GET /api/v1/payments/balance
/// Provider-side account balance; requires `payments:read`.
pub async fn provider_balance(
    State(state): State<Arc<AppState>>,
    Extension(key): Extension<AuthorizedKey>,
) -> Result<Json<ApiResponse<ProviderBalance>>, ApiError> {
    key.require_scope("payments:read")?;

    let balance = state
        .provider
        .get_balance()
        .await
        .map_err(|e| ApiError::provider_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(balance)))
}

/// POST /api/v1/payments/cashin
/// Creates a pending transaction and a provider QR-code charge; requires
/// `payments:write`. The external id is the idempotent correlation key the
/// provider echoes back through the webhook.
pub async fn create_cashin(
    State(state): State<Arc<AppState>>,
    Extension(key): Extension<AuthorizedKey>,
    Json(payload): Json<CreateCashinRequest>,
) -> Result<Json<ApiResponse<CashinResponse>>, ApiError> {
    key.require_scope("payments:write")?;

    if payload.amount_cents <= 0 {
        return Err(ApiError::validation("amountCents must be positive"));
    }
    if payload.payer_name.trim().is_empty() {
        return Err(ApiError::validation("payerName is required"));
    }
    if payload.payer_document.trim().is_empty() {
        return Err(ApiError::validation("payerDocument is required"));
    }

    let external_id = payload
        .external_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if state
        .store
        .get_transaction_by_external_id(&external_id)
        .await
        .map_err(|e| ApiError::internal(format!("Transaction lookup failed: {e}")))?
        .is_some()
    {
        return Err(ApiError::validation(format!(
            "externalId {external_id} already exists"
        )));
    }

    state
        .store
        .create_pending_transaction(
            key.user_id,
            &external_id,
            payload.amount_cents,
            "BRL",
            Some(payload.payer_name.trim()),
            Some(payload.payer_document.trim()),
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to record transaction: {e}")))?;

    let charge = state
        .provider
        .create_cashin(&CashinRequest {
            external_id: external_id.clone(),
            value: payload.amount_cents,
            payer_name: payload.payer_name.trim().to_string(),
            payer_document: payload.payer_document.trim().to_string(),
        })
        .await
        .map_err(|e| ApiError::provider_error(e.to_string()))?;

    tracing::info!(%external_id, amount_cents = payload.amount_cents, "Cash-in charge created");

    Ok(Json(ApiResponse::success(CashinResponse {
        external_id,
        charge,
    })))
}
