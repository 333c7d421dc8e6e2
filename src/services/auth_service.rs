//! Domain service for authentication.
//!
//! Resolves credentials into an [`Identity`] that the session layers carry;
//! the dashboard and backoffice cookie namespaces both store this type, but
//! under separate session stores that are never conflated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Role;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not approved")]
    AccountNotApproved,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Resolved identity stored in a session after login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the resolved identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email/password pair
    /// does not match, and [`AuthError::AccountNotApproved`] for accounts
    /// still pending (or rejected by) the admin approval flow.
    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Re-resolves an identity by user id (e.g. for `me` endpoints).
    async fn get_identity(&self, user_id: i32) -> Result<Identity, AuthError>;
}
