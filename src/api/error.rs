use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::auth_service::AuthError;
use crate::services::impersonation_service::ImpersonationError;

/// API-boundary error. Every variant maps to one HTTP status and one
/// machine-readable code from a fixed vocabulary; clients branch on the code,
/// never on the message.
#[derive(Debug)]
pub enum ApiError {
    /// Dashboard request without a valid session
    Unauthorized(String),

    /// Backoffice request without a session cookie
    NoToken,

    /// Valid identity, role outside the backoffice/admin set
    NotAdmin,

    /// Unknown, revoked or absent API key
    InvalidApiKey,

    /// API key lacks the requested scope
    MissingScope(String),

    /// Caller IP not in the key's allow-list
    IpNotAllowed,

    /// API key past its expiry
    KeyExpired,

    /// Required token field absent from body or query
    MissingToken,

    /// Unknown impersonation token
    InvalidSession,

    /// Second end call on the same impersonation session
    SessionAlreadyEnded,

    ValidationError(String),

    NotFound(String),

    DatabaseError(String),

    /// Upstream provider or relay failure
    ExternalApiError { service: String, message: String },

    InternalError(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::NoToken | Self::InvalidApiKey => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotAdmin | Self::MissingScope(_) | Self::IpNotAllowed | Self::KeyExpired => {
                StatusCode::FORBIDDEN
            }
            Self::MissingToken
            | Self::InvalidSession
            | Self::SessionAlreadyEnded
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::ExternalApiError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NoToken => "NO_TOKEN",
            Self::NotAdmin => "NOT_ADMIN",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::MissingScope(_) => "MISSING_SCOPE",
            Self::IpNotAllowed => "IP_NOT_ALLOWED",
            Self::KeyExpired => "KEY_EXPIRED",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidSession => "INVALID_SESSION",
            Self::SessionAlreadyEnded => "SESSION_ALREADY_ENDED",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::DatabaseError(_) | Self::InternalError(_) => "INTERNAL_ERROR",
            Self::ExternalApiError { .. } => "SERVER_ERROR",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::NoToken => write!(f, "No authentication token"),
            Self::NotAdmin => write!(f, "Not an admin"),
            Self::InvalidApiKey => write!(f, "Invalid API key"),
            Self::MissingScope(scope) => write!(f, "Missing scope: {scope}"),
            Self::IpNotAllowed => write!(f, "IP not allowed"),
            Self::KeyExpired => write!(f, "API key expired"),
            Self::MissingToken => write!(f, "Token is required"),
            Self::InvalidSession => write!(f, "Invalid session"),
            Self::SessionAlreadyEnded => write!(f, "Session already ended"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ExternalApiError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();

        // Store and internal failures are logged in full but genericized for
        // the client; everything else is already client-safe.
        let message = match &self {
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                "An internal error occurred".to_string()
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                "An internal error occurred".to_string()
            }
            Self::ExternalApiError { service, message } => {
                tracing::warn!("{service} API error: {message}");
                format!("{service} request failed")
            }
            other => other.to_string(),
        };

        let body = ApiResponse::<()>::error(message, code);
        (self.status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::AccountNotApproved => {
                Self::Unauthorized("Account is not approved".to_string())
            }
            AuthError::UserNotFound => Self::Unauthorized("User not found".to_string()),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ImpersonationError> for ApiError {
    fn from(err: ImpersonationError) -> Self {
        match err {
            ImpersonationError::InvalidSession => Self::InvalidSession,
            ImpersonationError::AlreadyEnded => Self::SessionAlreadyEnded,
            ImpersonationError::SellerNotFound => Self::NotFound("Seller not found".to_string()),
            ImpersonationError::Validation(msg) => Self::ValidationError(msg),
            ImpersonationError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn provider_error(msg: impl Into<String>) -> Self {
        Self::ExternalApiError {
            service: "Cash-in provider".to_string(),
            message: msg.into(),
        }
    }

    pub fn relay_error(msg: impl Into<String>) -> Self {
        Self::ExternalApiError {
            service: "Webhook relay".to_string(),
            message: msg.into(),
        }
    }
}
