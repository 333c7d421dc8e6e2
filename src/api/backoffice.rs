use axum::{
    Json,
    extract::{Query, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{SESSION_IDENTITY_KEY, resolve_identity};
use super::{ApiError, ApiResponse, AppState, LoginRequest, UserDto};
use crate::domain::UserStatus;
use crate::services::{DebugLogEntry, Identity};

const DEFAULT_USER_LIMIT: u64 = 50;
const MAX_USER_LIMIT: u64 = 200;

// ============================================================================
// Middleware
// ============================================================================

/// Backoffice gate: requires an identity in the `backoffice-auth-token`
/// cookie session AND a role from the backoffice set. A missing session is
/// `NO_TOKEN`; a present identity with the wrong role is `NOT_ADMIN`.
pub async fn backoffice_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let Some(identity) = resolve_identity(&session).await else {
        return Err(ApiError::NoToken);
    };

    if !identity.role.backoffice_allowed() {
        return Err(ApiError::NotAdmin);
    }

    tracing::Span::current().record("user_id", identity.id);

    Ok(next.run(request).await)
}

/// Backoffice identity from the session; the middleware has already gated
/// role membership for protected routes.
pub async fn backoffice_identity(session: &Session) -> Result<Identity, ApiError> {
    resolve_identity(session).await.ok_or(ApiError::NoToken)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/backoffice/auth/login
/// Backoffice session login. Rejected outright when the backoffice surface
/// is disabled, and restricted to backoffice-allowed roles.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if !state.config.backoffice.enabled {
        return Err(ApiError::NotFound("Backoffice is disabled".to_string()));
    }

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let identity = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    if !identity.role.backoffice_allowed() {
        return Err(ApiError::NotAdmin);
    }

    session
        .insert(SESSION_IDENTITY_KEY, &identity)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let user = state
        .store
        .get_user_by_id(identity.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::internal("User vanished during login"))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /api/backoffice/auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<()>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(()))
}

/// GET /api/backoffice/auth/me
/// Returns the flat user object (not the success envelope) — the backoffice
/// frontend consumes this shape directly.
pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<UserDto>, ApiError> {
    let identity = backoffice_identity(&session).await?;

    let user = state
        .store
        .get_user_by_id(identity.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or(ApiError::NoToken)?;

    Ok(Json(UserDto::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// GET /api/backoffice/users?status=&limit=
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            UserStatus::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("Unknown status: {raw}")))?,
        ),
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_USER_LIMIT)
        .min(MAX_USER_LIMIT);

    let users = state
        .store
        .list_users(status, limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list users: {e}")))?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// GET /api/backoffice/debug/logs
/// Contents of the in-memory diagnostics ring buffer, oldest first.
pub async fn debug_logs(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<DebugLogEntry>>> {
    Json(ApiResponse::success(state.debug_log.snapshot()))
}
