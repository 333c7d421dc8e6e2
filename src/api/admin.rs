use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_identity;
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::domain::UserStatus;

const DEFAULT_USER_LIMIT: u64 = 50;
const MAX_USER_LIMIT: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Admin endpoints live inside the dashboard session but require an
/// admin-set role on top of it.
async fn require_admin(session: &Session) -> Result<(), ApiError> {
    let identity = current_identity(session).await?;

    if !identity.role.backoffice_allowed() {
        return Err(ApiError::NotAdmin);
    }

    Ok(())
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    require_admin(&session).await?;

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

/// POST /api/admin/users/{id}/approve
pub async fn approve_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    set_status(state, session, id, UserStatus::Approved).await
}

/// POST /api/admin/users/{id}/reject
pub async fn reject_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    set_status(state, session, id, UserStatus::Rejected).await
}

async fn set_status(
    state: Arc<AppState>,
    session: Session,
    id: i32,
    status: UserStatus,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(&session).await?;

    let user = state
        .store
        .set_user_status(id, status)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;

    tracing::info!(user_id = id, status = %status, "User status updated");

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
