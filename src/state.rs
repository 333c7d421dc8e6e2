use std::sync::Arc;

use crate::clients::provider::{CashinProviderClient, ProviderConfig};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, DebugLogBuffer, ImpersonationService, RelayService, SeaOrmAuthService,
    SeaOrmImpersonationService,
};

/// Capacity of the in-memory diagnostics ring buffer.
const DEBUG_LOG_CAPACITY: usize = 100;

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across the relay and the provider client to enable connection
/// pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Pixgate/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub provider: Arc<CashinProviderClient>,

    pub auth_service: Arc<dyn AuthService>,

    pub impersonation: Arc<dyn ImpersonationService>,

    pub relay: Arc<RelayService>,

    pub debug_log: Arc<DebugLogBuffer>,

    pub start_time: std::time::Instant,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let http_client = build_shared_http_client(config.provider.request_timeout_seconds)?;

    let provider = Arc::new(CashinProviderClient::with_shared_client(
        ProviderConfig {
            base_url: config.provider.base_url.clone(),
            bearer_token: config.provider.bearer_token.clone(),
        },
        http_client.clone(),
    ));

    let debug_log = Arc::new(DebugLogBuffer::new(DEBUG_LOG_CAPACITY));

    let relay = Arc::new(RelayService::new(
        http_client,
        config.provider.confirm_url.clone(),
        debug_log.clone(),
    ));

    let auth_service =
        Arc::new(SeaOrmAuthService::new(store.clone())) as Arc<dyn AuthService + 'static>;

    let impersonation = Arc::new(SeaOrmImpersonationService::new(
        store.clone(),
        config.security.impersonation_ttl_minutes,
    )) as Arc<dyn ImpersonationService + 'static>;

    Ok(Arc::new(AppState {
        config,
        store,
        provider,
        auth_service,
        impersonation,
        relay,
        debug_log,
        start_time: std::time::Instant::now(),
    }))
}
