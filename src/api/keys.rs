use axum::{
    Json,
    extract::{Path, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_identity;
use super::{
    ApiError, ApiKeyDto, ApiResponse, AppState, CreateApiKeyRequest, CreatedApiKeyDto,
};
use crate::db::ApiKey;
use crate::domain::roles::is_valid_scope;
use crate::domain::scope_granted;

/// Key identity injected into merchant requests by [`api_key_auth`].
#[derive(Debug, Clone)]
pub struct AuthorizedKey {
    pub id: i32,
    pub user_id: i32,
    pub scopes: Vec<String>,
}

impl AuthorizedKey {
    /// Gate an operation on a granted scope. Each merchant handler names the
    /// one capability it needs.
    pub fn require_scope(&self, scope: &str) -> Result<(), ApiError> {
        if scope_granted(&self.scopes, scope) {
            Ok(())
        } else {
            Err(ApiError::MissingScope(scope.to_string()))
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// API-key authentication for merchant routes. The key comes from the
/// `X-Api-Key` header or `Authorization: Bearer`; each failing check is a
/// distinct rejection: unknown/revoked key, disallowed caller IP, expiry.
/// Scope gating happens per-handler via [`AuthorizedKey::require_scope`].
pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let Some(key_material) = extract_api_key(&headers) else {
        return Err(ApiError::InvalidApiKey);
    };

    let key = state
        .store
        .get_api_key(&key_material)
        .await
        .map_err(|e| ApiError::internal(format!("API key lookup failed: {e}")))?
        .ok_or(ApiError::InvalidApiKey)?;

    if key.revoked_at.is_some() {
        return Err(ApiError::InvalidApiKey);
    }

    if !key.allowed_ips.is_empty() {
        let caller = client_ip(&headers);
        let allowed = caller.is_some_and(|ip| {
            key.allowed_ips
                .iter()
                .any(|entry| entry.parse::<IpAddr>().is_ok_and(|allowed| allowed == ip))
        });
        if !allowed {
            return Err(ApiError::IpNotAllowed);
        }
    }

    if is_expired(&key, Utc::now()) {
        return Err(ApiError::KeyExpired);
    }

    // Best-effort usage stamp; failures must not reject the request
    let _ = state.store.touch_api_key(key.id).await;

    request.extensions_mut().insert(AuthorizedKey {
        id: key.id,
        user_id: key.user_id,
        scopes: key.scopes,
    });

    Ok(next.run(request).await)
}

/// Extract API key from headers: `X-Api-Key` first, then `Authorization: Bearer`.
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

fn is_expired(key: &ApiKey, now: DateTime<Utc>) -> bool {
    key.expires_at.as_deref().is_some_and(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map_or(true, |expires_at| now >= expires_at.with_timezone(&Utc))
    })
}

// ============================================================================
// Management handlers (dashboard session)
// ============================================================================

/// GET /api/keys
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<ApiKeyDto>>>, ApiError> {
    let identity = current_identity(&session).await?;

    let keys = state
        .store
        .list_api_keys(identity.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list API keys: {e}")))?;

    Ok(Json(ApiResponse::success(
        keys.into_iter().map(ApiKeyDto::from).collect(),
    )))
}

/// POST /api/keys
/// Creates a key; the full key material appears in this response only.
pub async fn create_key(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateApiKeyRequest>,
) -> Result<Json<ApiResponse<CreatedApiKeyDto>>, ApiError> {
    let identity = current_identity(&session).await?;

    if payload.label.trim().is_empty() {
        return Err(ApiError::validation("Label is required"));
    }
    if payload.scopes.is_empty() {
        return Err(ApiError::validation("At least one scope is required"));
    }
    for scope in &payload.scopes {
        if !is_valid_scope(scope) {
            return Err(ApiError::validation(format!("Invalid scope: {scope}")));
        }
    }
    for ip in &payload.allowed_ips {
        if ip.parse::<IpAddr>().is_err() {
            return Err(ApiError::validation(format!("Invalid IP address: {ip}")));
        }
    }
    if let Some(expires_at) = payload.expires_at.as_deref()
        && DateTime::parse_from_rfc3339(expires_at).is_err()
    {
        return Err(ApiError::validation("expiresAt must be an RFC 3339 timestamp"));
    }

    let key = state
        .store
        .create_api_key(
            identity.id,
            payload.label.trim(),
            &payload.scopes,
            &payload.allowed_ips,
            payload.expires_at,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create API key: {e}")))?;

    tracing::info!(user_id = identity.id, key_id = key.id, "API key created");

    Ok(Json(ApiResponse::success(CreatedApiKeyDto {
        id: key.id,
        label: key.label,
        key: key.key,
        scopes: key.scopes,
        expires_at: key.expires_at,
    })))
}

/// DELETE /api/keys/{id}
pub async fn revoke_key(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let identity = current_identity(&session).await?;

    let revoked = state
        .store
        .revoke_api_key(id, identity.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to revoke API key: {e}")))?;

    if !revoked {
        return Err(ApiError::NotFound(format!("API key {id} not found")));
    }

    tracing::info!(user_id = identity.id, key_id = id, "API key revoked");

    Ok(Json(ApiResponse::success(())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(expires_at: Option<&str>) -> ApiKey {
        ApiKey {
            id: 1,
            user_id: 1,
            key: "k".to_string(),
            label: "test".to_string(),
            scopes: vec!["payments:read".to_string()],
            allowed_ips: vec![],
            expires_at: expires_at.map(ToString::to_string),
            revoked_at: None,
            created_at: "2026-03-02T12:00:00+00:00".to_string(),
            last_used_at: None,
        }
    }

    #[test]
    fn no_expiry_never_expires() {
        assert!(!is_expired(&key(None), Utc::now()));
    }

    #[test]
    fn expiry_boundary() {
        let now = DateTime::parse_from_rfc3339("2026-03-02T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);

        assert!(is_expired(&key(Some("2026-03-02T11:59:59+00:00")), now));
        assert!(!is_expired(&key(Some("2026-03-02T12:00:01+00:00")), now));
        // A malformed expiry fails closed
        assert!(is_expired(&key(Some("garbage")), now));
    }
}
