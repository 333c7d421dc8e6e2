use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub backoffice: BackofficeConfig,

    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/pixgate.db".to_string(),
            log_level: "info".to_string(),
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Default: true for production safety. Set to false for local
    /// development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            cors_allowed_origins: vec![
                "http://localhost:8787".to_string(),
                "http://127.0.0.1:8787".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Inactivity expiry for dashboard and backoffice session cookies.
    pub session_ttl_minutes: i64,

    /// Lifetime of an impersonation bearer token.
    pub impersonation_ttl_minutes: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            session_ttl_minutes: 60,
            impersonation_ttl_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackofficeConfig {
    /// Master switch for the backoffice surface; when off, backoffice login
    /// is rejected outright.
    pub enabled: bool,
}

impl Default for BackofficeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,

    pub bearer_token: String,

    /// Where the webhook relay forwards normalized confirmations. Defaults
    /// to this process's own confirmation endpoint.
    pub confirm_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.cashin.example".to_string(),
            bearer_token: "change-me".to_string(),
            confirm_url: "http://127.0.0.1:8787/api/transactions/confirm".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();

        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(&path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment wins over file values for the handful of settings that
    /// differ per deployment.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PIXGATE_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
        if let Ok(path) = std::env::var("PIXGATE_DATABASE_PATH") {
            self.general.database_path = path;
        }
        if let Ok(url) = std::env::var("PIXGATE_PROVIDER_URL") {
            self.provider.base_url = url;
        }
        if let Ok(token) = std::env::var("PIXGATE_PROVIDER_TOKEN") {
            self.provider.bearer_token = token;
        }
        if let Ok(url) = std::env::var("PIXGATE_CONFIRM_URL") {
            self.provider.confirm_url = url;
        }
        if let Ok(enabled) = std::env::var("PIXGATE_BACKOFFICE_ENABLED")
            && let Ok(enabled) = enabled.parse()
        {
            self.backoffice.enabled = enabled;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.provider.base_url.is_empty() {
            anyhow::bail!("Provider base URL cannot be empty");
        }

        url::Url::parse(&self.provider.base_url).context("Invalid provider base URL")?;
        url::Url::parse(&self.provider.confirm_url).context("Invalid confirm URL")?;

        if self.security.argon2_memory_cost_kib == 0
            || self.security.argon2_time_cost == 0
            || self.security.argon2_parallelism == 0
        {
            anyhow::bail!("Argon2 parameters must be non-zero");
        }

        if self.security.impersonation_ttl_minutes <= 0 {
            anyhow::bail!("Impersonation TTL must be positive");
        }

        Ok(())
    }
}
