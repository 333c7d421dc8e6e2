//! Domain service for admin-assumes-seller support sessions.
//!
//! A session is `Active` until it is explicitly ended (terminal) or its
//! expiry elapses (terminal, detected lazily at validation time; there is no
//! background sweep). Ending twice is an error, not a silent success, so the
//! audit trail records exactly one legitimate end event per session.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImpersonationError {
    #[error("Invalid session")]
    InvalidSession,

    #[error("Session already ended")]
    AlreadyEnded,

    #[error("Seller not found")]
    SellerNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ImpersonationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Token handed to the admin when a session starts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpersonationGrant {
    pub token: String,
    pub expires_at: String,
}

/// An active session as seen by `validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpersonationSession {
    pub token: String,
    pub admin_id: i32,
    pub seller_id: i32,
    pub started_at: String,
    pub expires_at: String,
}

#[async_trait::async_trait]
pub trait ImpersonationService: Send + Sync {
    /// Issues a bearer token bound to one admin+seller pair with a bounded
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`ImpersonationError::SellerNotFound`] when the target does
    /// not exist or does not hold the seller role.
    async fn start(
        &self,
        admin_id: i32,
        seller_id: i32,
    ) -> Result<ImpersonationGrant, ImpersonationError>;

    /// Returns the session for a token, or `None` for unknown, ended or
    /// expired tokens — an expired session is never handed back.
    async fn validate(
        &self,
        token: &str,
    ) -> Result<Option<ImpersonationSession>, ImpersonationError>;

    /// Ends a session, recording the caller's IP and user agent.
    ///
    /// # Errors
    ///
    /// [`ImpersonationError::InvalidSession`] for an unknown token;
    /// [`ImpersonationError::AlreadyEnded`] when called twice on the same
    /// session.
    async fn end(
        &self,
        token: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), ImpersonationError>;
}
