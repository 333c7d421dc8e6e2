use serde::{Deserialize, Serialize};

use crate::db::{ApiKey, User, Wallet};
use crate::services::Identity;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.as_str().to_string(),
            status: user.status.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<Identity> for IdentityDto {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            role: identity.role.as_str().to_string(),
        }
    }
}

/// Wallet balance as the dashboard consumes it, integer BRL cents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDto {
    pub brl_amount: i64,
    pub total_deposited: i64,
    pub total_withdrawn: i64,
}

impl From<Wallet> for BalanceDto {
    fn from(wallet: Wallet) -> Self {
        Self {
            brl_amount: wallet.brl_cents,
            total_deposited: wallet.total_deposited_cents,
            total_withdrawn: wallet.total_withdrawn_cents,
        }
    }
}

/// API key as listed back to its owner. Key material is only ever returned
/// from the create call; listings carry a prefix for recognition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyDto {
    pub id: i32,
    pub label: String,
    pub key_prefix: String,
    pub scopes: Vec<String>,
    pub allowed_ips: Vec<String>,
    pub expires_at: Option<String>,
    pub revoked: bool,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

impl From<ApiKey> for ApiKeyDto {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            label: key.label,
            key_prefix: key.key.chars().take(8).collect(),
            scopes: key.scopes,
            allowed_ips: key.allowed_ips,
            expires_at: key.expires_at,
            revoked: key.revoked_at.is_some(),
            created_at: key.created_at,
            last_used_at: key.last_used_at,
        }
    }
}

/// Create response: the one place full key material is handed out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApiKeyDto {
    pub id: i32,
    pub label: String,
    pub key: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub label: String,
    pub scopes: Vec<String>,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
