use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::backoffice::backoffice_identity;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{ImpersonationGrant, ImpersonationSession};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub seller_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// POST /api/backoffice/impersonation/start
pub async fn start(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<StartRequest>,
) -> Result<Json<ApiResponse<ImpersonationGrant>>, ApiError> {
    let admin = backoffice_identity(&session).await?;

    let grant = state
        .impersonation
        .start(admin.id, payload.seller_id)
        .await?;

    Ok(Json(ApiResponse::success(grant)))
}

/// GET /api/backoffice/impersonation/validate?token=
/// Valid sessions come back as data; unknown, ended and expired tokens are
/// all reported as invalid rather than erroring.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<ApiResponse<ValidateResponse>>, ApiError> {
    let token = match query.token.as_deref() {
        None | Some("") => return Err(ApiError::MissingToken),
        Some(token) => token,
    };

    let session = state.impersonation.validate(token).await?;

    Ok(Json(ApiResponse::success(ValidateResponse {
        valid: session.is_some(),
        session,
    })))
}

#[derive(Debug, serde::Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<ImpersonationSession>,
}

/// POST /api/backoffice/impersonation/end
/// Ending is idempotent-detecting: a second end on the same token is a 400
/// with `SESSION_ALREADY_ENDED`, not a silent success.
pub async fn end(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<EndRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let token = match payload.token.as_deref() {
        None | Some("") => return Err(ApiError::MissingToken),
        Some(token) => token,
    };

    let ip = client_ip(&headers);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    state
        .impersonation
        .end(token, ip.as_deref(), user_agent.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(())))
}

/// First hop of X-Forwarded-For, when present.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
