use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_identity;
use super::{ApiError, ApiResponse, AppState, BalanceDto};

/// GET /api/pix/balance
/// Wallet balance for the current user. A user without a wallet gets one
/// created on the spot with zeroed balance and totals.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<BalanceResponse>>, ApiError> {
    let identity = current_identity(&session).await?;

    let wallet = state
        .store
        .get_or_create_wallet(identity.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load wallet: {e}")))?;

    Ok(Json(ApiResponse::success(BalanceResponse {
        balance: BalanceDto::from(wallet),
    })))
}

#[derive(Debug, serde::Serialize)]
pub struct BalanceResponse {
    pub balance: BalanceDto,
}
