use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use time;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub mod admin;
pub mod auth;
pub mod backoffice;
mod error;
pub mod impersonation;
pub mod keys;
pub mod payments;
pub mod pix;
mod types;
pub mod webhooks;

pub use error::ApiError;
pub use types::*;

pub use crate::state::AppState;

/// Dashboard session cookie. Never shared with the backoffice namespace.
pub const DASHBOARD_COOKIE: &str = "auth-token";

/// Backoffice session cookie. A separate cookie name AND a separate session
/// store keep the two surfaces from ever resolving each other's sessions.
pub const BACKOFFICE_COOKIE: &str = "backoffice-auth-token";

fn session_layer(
    cookie_name: &'static str,
    secure: bool,
    ttl_minutes: i64,
) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(cookie_name)
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(ttl_minutes)))
}

pub fn router(state: Arc<AppState>) -> Router {
    let secure_cookies = state.config.server.secure_cookies;
    let session_ttl = state.config.security.session_ttl_minutes;
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    // Dashboard surface: public auth endpoints plus session-protected routes
    let dashboard_protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/pix/balance", get(pix::get_balance))
        .route("/keys", get(keys::list_keys).post(keys::create_key))
        .route("/keys/{id}", delete(keys::revoke_key))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}/approve", post(admin::approve_user))
        .route("/admin/users/{id}/reject", post(admin::reject_user))
        .route_layer(middleware::from_fn(auth::dashboard_auth));

    let dashboard = Router::new()
        .merge(dashboard_protected)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/test", get(auth::session_test))
        .layer(session_layer(DASHBOARD_COOKIE, secure_cookies, session_ttl));

    // Backoffice surface: isolated cookie namespace and role gate
    let backoffice_protected = Router::new()
        .route("/backoffice/auth/me", get(backoffice::me))
        .route("/backoffice/users", get(backoffice::list_users))
        .route("/backoffice/impersonation/start", post(impersonation::start))
        .route(
            "/backoffice/impersonation/validate",
            get(impersonation::validate),
        )
        .route("/backoffice/impersonation/end", post(impersonation::end))
        .route("/backoffice/debug/logs", get(backoffice::debug_logs))
        .route_layer(middleware::from_fn(backoffice::backoffice_auth));

    let backoffice = Router::new()
        .merge(backoffice_protected)
        .route("/backoffice/auth/login", post(backoffice::login))
        .route("/backoffice/auth/logout", post(backoffice::logout))
        .layer(session_layer(
            BACKOFFICE_COOKIE,
            secure_cookies,
            session_ttl,
        ));

    // Merchant surface: API-key authenticated, scope-gated per handler
    let merchant = Router::new()
        .route("/v1/payments/balance", get(payments::provider_balance))
        .route("/v1/payments/cashin", post(payments::create_cashin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            keys::api_key_auth,
        ));

    // Webhook surface: called by the provider and the relay itself
    let webhook_routes = Router::new()
        .route("/webhooks/cashin", post(webhooks::provider_callback))
        .route("/test-webhook", post(webhooks::test_webhook))
        .route("/transactions/confirm", post(webhooks::confirm_transaction));

    let api_router = Router::new()
        .merge(dashboard)
        .merge(backoffice)
        .merge(merchant)
        .merge(webhook_routes)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> axum::Json<ApiResponse<&'static str>> {
    axum::Json(ApiResponse::success("ok"))
}
