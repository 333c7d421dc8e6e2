pub mod auth_service;
pub mod auth_service_impl;
pub mod debug_log;
pub mod impersonation_service;
pub mod impersonation_service_impl;
pub mod relay;

pub use auth_service::{AuthError, AuthService, Identity};
pub use auth_service_impl::SeaOrmAuthService;
pub use debug_log::{DebugLogBuffer, DebugLogEntry};
pub use impersonation_service::{
    ImpersonationError, ImpersonationGrant, ImpersonationService, ImpersonationSession,
};
pub use impersonation_service_impl::SeaOrmImpersonationService;
pub use relay::RelayService;
