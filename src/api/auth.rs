use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, IdentityDto, LoginRequest, UserDto};
use crate::services::Identity;

/// Session key under which the resolved identity is stored after login.
/// Shared by the dashboard and backoffice handlers — the two surfaces are
/// kept apart by their separate cookie namespaces and session stores, not by
/// this key.
pub const SESSION_IDENTITY_KEY: &str = "identity";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTestResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityDto>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Dashboard authentication middleware: requires an identity in the
/// `auth-token` cookie session. An absent or invalid session is a clean 401
/// with code `UNAUTHORIZED`, never an internal error.
pub async fn dashboard_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let identity = resolve_identity(&session).await;

    let Some(identity) = identity else {
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    };

    tracing::Span::current().record("user_id", identity.id);

    Ok(next.run(request).await)
}

/// Resolve the identity carried by a session, if any. Session-layer failures
/// count as "no identity" — resolution never throws for the absent case.
pub async fn resolve_identity(session: &Session) -> Option<Identity> {
    session
        .get::<Identity>(SESSION_IDENTITY_KEY)
        .await
        .ok()
        .flatten()
}

/// Get the identity from the session, or reject as unauthenticated.
pub async fn current_identity(session: &Session) -> Result<Identity, ApiError> {
    resolve_identity(session)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
/// Authenticate with email and password, establishing the dashboard session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let identity = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_IDENTITY_KEY, &identity)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(IdentityDto::from(identity))))
}

/// POST /api/auth/logout
/// Invalidate the current dashboard session; the cookie is cleared.
pub async fn logout(session: Session) -> Json<ApiResponse<()>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(()))
}

/// GET /api/auth/test
/// Reports whether the request carries a valid dashboard session.
pub async fn session_test(session: Session) -> Json<ApiResponse<SessionTestResponse>> {
    let identity = resolve_identity(&session).await;

    Json(ApiResponse::success(SessionTestResponse {
        authenticated: identity.is_some(),
        identity: identity.map(IdentityDto::from),
    }))
}

/// GET /api/auth/me
/// Current user record for the dashboard session.
pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let identity = current_identity(&session).await?;

    let user = state
        .store
        .get_user_by_id(identity.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
