use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::webhook::TransactionConfirmation;
use crate::domain::{Role, UserStatus};

pub mod migrator;
pub mod repositories;

pub use repositories::api_key::ApiKey;
pub use repositories::impersonation::ImpersonationRecord;
pub use repositories::transaction::{ConfirmOutcome, TransactionRecord};
pub use repositories::user::User;
pub use repositories::wallet::Wallet;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with("sqlite::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn wallet_repo(&self) -> repositories::wallet::WalletRepository {
        repositories::wallet::WalletRepository::new(self.conn.clone())
    }

    fn api_key_repo(&self) -> repositories::api_key::ApiKeyRepository {
        repositories::api_key::ApiKeyRepository::new(self.conn.clone())
    }

    fn impersonation_repo(&self) -> repositories::impersonation::ImpersonationRepository {
        repositories::impersonation::ImpersonationRepository::new(self.conn.clone())
    }

    fn transaction_repo(&self) -> repositories::transaction::TransactionRepository {
        repositories::transaction::TransactionRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: Role,
        status: UserStatus,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(email, name, password, role, status, security)
            .await
    }

    pub async fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn list_users(&self, status: Option<UserStatus>, limit: u64) -> Result<Vec<User>> {
        self.user_repo().list(status, limit).await
    }

    pub async fn set_user_status(&self, id: i32, status: UserStatus) -> Result<Option<User>> {
        self.user_repo().set_status(id, status).await
    }

    // ========== PIX wallets ==========

    pub async fn get_or_create_wallet(&self, user_id: i32) -> Result<Wallet> {
        self.wallet_repo().get_or_create(user_id).await
    }

    // ========== API keys ==========

    pub async fn create_api_key(
        &self,
        user_id: i32,
        label: &str,
        scopes: &[String],
        allowed_ips: &[String],
        expires_at: Option<String>,
    ) -> Result<ApiKey> {
        self.api_key_repo()
            .create(user_id, label, scopes, allowed_ips, expires_at)
            .await
    }

    pub async fn get_api_key(&self, key: &str) -> Result<Option<ApiKey>> {
        self.api_key_repo().get_by_key(key).await
    }

    pub async fn list_api_keys(&self, user_id: i32) -> Result<Vec<ApiKey>> {
        self.api_key_repo().list_for_user(user_id).await
    }

    pub async fn revoke_api_key(&self, id: i32, user_id: i32) -> Result<bool> {
        self.api_key_repo().revoke(id, user_id).await
    }

    pub async fn touch_api_key(&self, id: i32) -> Result<()> {
        self.api_key_repo().touch_last_used(id).await
    }

    // ========== Impersonation sessions ==========

    pub async fn create_impersonation_session(
        &self,
        token: &str,
        admin_id: i32,
        seller_id: i32,
        started_at: &str,
        expires_at: &str,
    ) -> Result<ImpersonationRecord> {
        self.impersonation_repo()
            .create(token, admin_id, seller_id, started_at, expires_at)
            .await
    }

    pub async fn get_impersonation_session(
        &self,
        token: &str,
    ) -> Result<Option<ImpersonationRecord>> {
        self.impersonation_repo().get_by_token(token).await
    }

    pub async fn end_impersonation_session(
        &self,
        record: ImpersonationRecord,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        self.impersonation_repo()
            .mark_ended(record, ip, user_agent)
            .await
    }

    // ========== Transactions ==========

    pub async fn create_pending_transaction(
        &self,
        user_id: i32,
        external_id: &str,
        amount_cents: i64,
        currency: &str,
        payer_name: Option<&str>,
        payer_document: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.transaction_repo()
            .create_pending(
                user_id,
                external_id,
                amount_cents,
                currency,
                payer_name,
                payer_document,
            )
            .await
    }

    pub async fn get_transaction_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<TransactionRecord>> {
        self.transaction_repo()
            .get_by_external_id(external_id)
            .await
    }

    /// Apply a normalized confirmation and credit the owning wallet when the
    /// transition deposited funds. Idempotent by `external_id`.
    pub async fn confirm_transaction(
        &self,
        confirmation: &TransactionConfirmation,
    ) -> Result<ConfirmOutcome> {
        let outcome = self
            .transaction_repo()
            .apply_confirmation(confirmation)
            .await?;

        if let Some((user_id, amount_cents)) = outcome.credit {
            self.wallet_repo()
                .apply_deposit(user_id, amount_cents)
                .await?;
        }

        Ok(outcome)
    }
}
